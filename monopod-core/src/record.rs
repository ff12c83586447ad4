//! Types and traits for recording training metrics.
//!
//! * [`Record`] - a container of key-value pairs
//! * [`RecordValue`] - the value types a [`Record`] holds
//! * [`Recorder`] - writes records immediately, e.g., per-episode returns
//! * [`AggregateRecorder`] - stores records and flushes their aggregate once per epoch
//! * [`RecordStorage`] - the aggregation used by recorders
//! * [`BufferedRecorder`] - keeps everything in memory
//! * [`NullRecorder`] - discards all records
//!
//! ```rust
//! use monopod_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("episode_return", RecordValue::Scalar(-12.5));
//! record.insert("episode_length", RecordValue::Scalar(200.0));
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
pub use storage::RecordStorage;
