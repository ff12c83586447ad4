use crate::Activation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Mlp`](super::Mlp).
pub struct MlpConfig {
    pub(super) in_dim: usize,
    pub(super) units: Vec<usize>,
    pub(super) out_dim: usize,
    pub(super) activation: Activation,
    pub(super) activation_out: Activation,
}

impl MlpConfig {
    /// Creates configuration of MLP.
    ///
    /// * `units` - the sizes of the hidden layers
    /// * `activation` - the activation function of the hidden layers
    /// * `activation_out` - the activation function of the output layer
    pub fn new(
        in_dim: usize,
        units: Vec<usize>,
        out_dim: usize,
        activation: Activation,
        activation_out: Activation,
    ) -> Self {
        Self {
            in_dim,
            units,
            out_dim,
            activation,
            activation_out,
        }
    }

    /// Returns the output dimension.
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }
}
