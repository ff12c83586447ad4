use super::{AggregateRecorder, Record, RecordStorage, Recorder};

/// Buffered recorder.
///
/// Keeps written records and flushed aggregates in memory. This is used
/// for inspecting training runs in tests and short experiments.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
    storage: RecordStorage,
    flushed: Vec<(i64, Record)>,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the records given to [`Recorder::write`].
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.buf.iter()
    }

    /// Returns the aggregated records with the steps given to [`AggregateRecorder::flush`].
    pub fn flushed(&self) -> &[(i64, Record)] {
        &self.flushed
    }
}

impl Recorder for BufferedRecorder {
    /// Write a [`Record`] to the buffer.
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }
}

impl AggregateRecorder for BufferedRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        let record = self.storage.aggregate();
        self.flushed.push((step, record));
    }
}
