//! On-policy trajectory buffer with GAE-Lambda advantage estimation.
mod base;
mod batch;
mod config;
pub use base::{discount_cumsum, TrajectoryBuffer};
pub use batch::EpochBatch;
pub use config::TrajectoryBufferConfig;
