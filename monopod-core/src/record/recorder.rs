use super::Record;

/// Writes a record to an output destination with [`Recorder::write`].
pub trait Recorder {
    /// Write a record to the [`Recorder`] immediately.
    fn write(&mut self, record: Record);
}

/// A [`Recorder`] which additionally aggregates stored records.
///
/// [`Trainer`](crate::Trainer) stores per-epoch records and calls
/// [`AggregateRecorder::flush`] once at the end of every epoch.
pub trait AggregateRecorder: Recorder {
    /// Store the record.
    fn store(&mut self, record: Record);

    /// Writes values aggregated from the stored records.
    fn flush(&mut self, step: i64);
}
