//! Core functionalities.
mod agent;
mod env;
mod policy;
mod step;
pub use agent::{Agent, AgentStep};
pub use env::Env;
pub use policy::Policy;
use std::fmt::Debug;
pub use step::{Info, Step};

/// An observation of an environment.
///
/// Observations are fixed-length vectors of `f32`, which is what the
/// trajectory buffer stores.
pub trait Obs: Clone + Debug {
    /// Returns the observation as a flat slice.
    fn as_slice(&self) -> &[f32];

    /// Returns the dimension of the observation.
    fn dim(&self) -> usize {
        self.as_slice().len()
    }
}

/// An action applied to an environment.
///
/// Agents emit actions as `Vec<f32>`, converted with [`From`].
pub trait Act: Clone + Debug + From<Vec<f32>> {
    /// Returns the action as a flat slice.
    fn as_slice(&self) -> &[f32];

    /// Returns the dimension of the action.
    fn dim(&self) -> usize {
        self.as_slice().len()
    }
}

impl Obs for Vec<f32> {
    fn as_slice(&self) -> &[f32] {
        Vec::as_slice(self)
    }
}

impl Act for Vec<f32> {
    fn as_slice(&self) -> &[f32] {
        Vec::as_slice(self)
    }
}
