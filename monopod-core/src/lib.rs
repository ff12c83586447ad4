#![warn(missing_docs)]
//! Core components of PPO training for a monopod robot.
//!
//! This crate does not depend on any deep learning backend. It provides
//!
//! * the [`Env`], [`Policy`] and [`Agent`] traits,
//! * [`TrajectoryBuffer`], storing the transitions of an epoch and computing
//!   GAE-Lambda advantages and rewards-to-go,
//! * [`Trainer`], alternating rollouts, checkpoints, updates and evaluations,
//! * [`record`], the records and recorders of training metrics.
pub mod dummy;
pub mod error;
pub mod record;

mod base;
pub use base::{Act, Agent, AgentStep, Env, Info, Obs, Policy, Step};

mod trajectory_buffer;
pub use trajectory_buffer::{discount_cumsum, EpochBatch, TrajectoryBuffer, TrajectoryBufferConfig};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{EpisodeEnd, Sampler, Trainer, TrainerConfig};
