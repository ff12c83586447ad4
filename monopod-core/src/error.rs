//! Errors in the library.
use thiserror::Error;

/// Errors raised by the core components.
#[derive(Error, Debug)]
pub enum MonopodError {
    /// A transition was stored into a full trajectory buffer.
    #[error("Trajectory buffer overflow: capacity is {capacity}")]
    BufferOverflow {
        /// Capacity of the buffer.
        capacity: usize,
    },

    /// The epoch batch was requested before the buffer was filled.
    #[error("Trajectory buffer is not full: {len} of {capacity} slots are written")]
    BufferNotFull {
        /// The number of stored transitions.
        len: usize,

        /// Capacity of the buffer.
        capacity: usize,
    },

    /// An observation or action does not have the configured length.
    #[error("Shape mismatch of {name}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Name of the offending quantity.
        name: String,

        /// Configured length.
        expected: usize,

        /// Given length.
        actual: usize,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}
