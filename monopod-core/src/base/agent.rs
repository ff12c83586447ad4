//! Agent.
use super::{Env, Policy};
use crate::{record::Record, TrajectoryBuffer};
use anyhow::Result;
use std::path::Path;

/// Output of [`Agent::step`].
#[derive(Clone, Debug)]
pub struct AgentStep<A> {
    /// Action to be applied to the environment.
    pub act: A,

    /// Value estimate of the observation.
    pub value: f32,

    /// Log-probability of `act` under the current policy.
    pub logp: f32,
}

/// Represents a trainable actor-critic policy on an environment.
pub trait Agent<E: Env>: Policy<E> {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Takes an action with its value estimate and log-probability.
    ///
    /// If `deterministic` is `true`, the mode of the action distribution is taken.
    fn step(&mut self, obs: &E::Obs, deterministic: bool) -> Result<AgentStep<E::Act>>;

    /// Returns the value estimate of an observation.
    fn value(&mut self, obs: &E::Obs) -> Result<f32>;

    /// Performs an optimization step.
    ///
    /// `buffer` is a filled trajectory buffer from which the epoch batch is taken.
    fn opt(&mut self, buffer: &mut TrajectoryBuffer) -> Result<()> {
        self.opt_with_record(buffer).map(|_| ())
    }

    /// Performs an optimization step and returns some information.
    fn opt_with_record(&mut self, buffer: &mut TrajectoryBuffer) -> Result<Record>;

    /// Save the parameters of the agent in the given file.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given file.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
