//! PPO training of a control policy for a monopod robot.
//!
//! The workspace consists of the following crates:
//!
//! * [monopod-core](monopod_core) provides the environment and agent traits,
//!   the trajectory buffer computing GAE-Lambda advantages, the trainer and
//!   the records of training metrics. It does not depend on a deep learning backend.
//! * [monopod-candle-agent](monopod_candle_agent) implements the PPO agent
//!   with [candle](https://crates.io/crates/candle-core), including the family
//!   of action distributions: diagonal Gaussian, squashed Gaussian and three
//!   parameterizations of Beta.
//! * [monopod-tensorboard](monopod_tensorboard) has `TensorboardRecorder` to
//!   write records shown in TensorBoard, based on
//!   [tensorboard-rs](https://crates.io/crates/tensorboard-rs).
//! * `monopod` (this crate) has an environment to try the agent without a
//!   physics simulator and the `ppo_pendulum` example.
pub mod pendulum;
