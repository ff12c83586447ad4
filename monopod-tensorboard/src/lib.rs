//! TensorBoard recorder of training metrics.
use log::{trace, warn};
use monopod_core::record::{AggregateRecorder, Record, RecordStorage, RecordValue, Recorder};
use std::path::Path;
use tensorboard_rs::summary_writer::SummaryWriter;

/// Key of the step value in records given to [`Recorder::write`].
const STEP_KEY: &str = "env_steps";

/// Writes records to TFRecord files read by TensorBoard.
///
/// Records given to [`Recorder::write`], like per-episode returns, are written
/// at the step taken from their `env_steps` value. Records given to
/// [`AggregateRecorder::store`] are aggregated and written at the step given
/// to [`AggregateRecorder::flush`], the epoch.
///
/// Only scalars are written. Other values are discarded.
pub struct TensorboardRecorder {
    writer: SummaryWriter,
    storage: RecordStorage,
}

impl TensorboardRecorder {
    /// Constructs a [`TensorboardRecorder`].
    ///
    /// TFRecord will be stored in `logdir`.
    pub fn new<P: AsRef<Path>>(logdir: P) -> Self {
        Self {
            writer: SummaryWriter::new(logdir),
            storage: RecordStorage::new(),
        }
    }

    fn write_with_step(&mut self, record: &Record, step: usize) {
        for (k, v) in record.iter() {
            if k == STEP_KEY {
                continue;
            }
            match v {
                RecordValue::Scalar(v) => self.writer.add_scalar(k, *v, step),
                _ => trace!("Discard non-scalar value of {}", k),
            }
        }
    }
}

impl Recorder for TensorboardRecorder {
    /// Writes a [`Record`] at the step given by its `env_steps` value.
    ///
    /// Records without a scalar step value are discarded.
    fn write(&mut self, record: Record) {
        let step = match record.get(STEP_KEY) {
            Some(RecordValue::Scalar(v)) => *v as usize,
            _ => {
                warn!("Record without step key {:?} is discarded", STEP_KEY);
                return;
            }
        };
        self.write_with_step(&record, step);
    }
}

impl AggregateRecorder for TensorboardRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        let record = self.storage.aggregate();
        self.write_with_step(&record, step.max(0) as usize);
        self.writer.flush();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;
    use chrono::Local;
    use tempdir::TempDir;

    #[test]
    fn test_write_event_file() -> Result<()> {
        let tmp = TempDir::new("tensorboard")?;
        let mut recorder = TensorboardRecorder::new(tmp.path());

        recorder.write(Record::from_slice(&[
            ("episode_return", RecordValue::Scalar(-120.0)),
            ("episode_end", RecordValue::String("time_limit".into())),
            ("env_steps", RecordValue::Scalar(200.0)),
        ]));
        recorder.write(Record::from_scalar("episode_return", 1.0));
        recorder.store(Record::from_slice(&[
            ("loss_pi", RecordValue::Scalar(0.1)),
            ("datetime", RecordValue::DateTime(Local::now())),
        ]));
        recorder.flush(0);
        assert!(recorder.storage.is_empty());

        // The event file is written by a thread joined on drop
        drop(recorder);
        assert!(std::fs::read_dir(tmp.path())?.count() > 0);
        Ok(())
    }
}
