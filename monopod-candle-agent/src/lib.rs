//! PPO agent implemented with [candle](https://crates.io/crates/candle-core).
//!
//! * [`distribution`] - the family of action distributions parameterizing the policy
//! * [`actor_critic`] - policy and value networks sharing one parameter store
//! * [`ppo`] - the PPO agent, implementing [`monopod_core::Agent`]
pub mod actor_critic;
pub mod distribution;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod ppo;
pub mod util;
use anyhow::Result;
use candle_core::Tensor;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl Device {
    /// Returns the corresponding [`candle_core::Device`].
    pub fn to_candle(self) -> Result<candle_core::Device> {
        match self {
            Self::Cpu => Ok(candle_core::Device::Cpu),
            Self::Cuda(n) => Ok(candle_core::Device::new_cuda(n)?),
        }
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

/// Activation functions of [`Mlp`](mlp::Mlp).
#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
pub enum Activation {
    /// No activation.
    Identity,

    /// ReLU.
    ReLU,

    /// Hyperbolic tangent.
    Tanh,

    /// `ln(1 + exp(x))`.
    Softplus,

    /// `1 / (1 + exp(-x))`.
    Sigmoid,
}

impl Activation {
    /// Applies the activation function.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        Ok(match self {
            Self::Identity => xs.clone(),
            Self::ReLU => xs.relu()?,
            Self::Tanh => xs.tanh()?,
            Self::Softplus => util::softplus(xs)?,
            Self::Sigmoid => candle_nn::ops::sigmoid(xs)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_output_activations() -> Result<()> {
        let xs = Tensor::from_slice(&[-50f32, -1.0, 0.0, 1.0], (4,), &candle_core::Device::Cpu)?;
        let sg = Activation::Sigmoid.forward(&xs)?.to_vec1::<f32>()?;
        let sp = Activation::Softplus.forward(&xs)?.to_vec1::<f32>()?;

        assert!(sg[0] >= 0.0 && sg[0] < 1e-6);
        assert!((sg[2] - 0.5).abs() < 1e-6);
        assert!((sg[1] + sg[3] - 1.0).abs() < 1e-6);
        assert!((sp[2] - 2f32.ln()).abs() < 1e-6);
        Ok(())
    }
}
