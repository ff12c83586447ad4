/// All transitions of an epoch, taken with
/// [`TrajectoryBuffer::get`](super::TrajectoryBuffer::get).
///
/// Observations and actions are row-major with `len()` rows.
#[derive(Clone, Debug)]
pub struct EpochBatch {
    /// Observations, `len() * obs_dim` values.
    pub obs: Vec<f32>,

    /// Actions, `len() * act_dim` values.
    pub act: Vec<f32>,

    /// Rewards-to-go, the targets of the value function.
    pub ret: Vec<f32>,

    /// Advantage estimates.
    pub adv: Vec<f32>,

    /// Log-probabilities of the actions at the time of sampling.
    pub logp: Vec<f32>,

    /// Dimension of observations.
    pub obs_dim: usize,

    /// Dimension of actions.
    pub act_dim: usize,
}

impl EpochBatch {
    /// The number of transitions.
    pub fn len(&self) -> usize {
        self.ret.len()
    }

    /// Returns `true` if the batch has no transitions.
    pub fn is_empty(&self) -> bool {
        self.ret.is_empty()
    }
}
