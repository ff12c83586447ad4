//! Multilayer perceptron.
mod base;
mod config;
use crate::Activation;
use anyhow::Result;
pub use base::Mlp;
use candle_core::Tensor;
use candle_nn::{Linear, Module};
pub use config::MlpConfig;

fn mlp_forward(
    xs: Tensor,
    layers: &[Linear],
    activation: &Activation,
    activation_out: &Activation,
) -> Result<Tensor> {
    let n_layers = layers.len();
    let mut xs = xs;

    for layer in layers.iter().take(n_layers - 1) {
        xs = activation.forward(&layer.forward(&xs)?)?;
    }

    let xs = layers[n_layers - 1].forward(&xs)?;
    activation_out.forward(&xs)
}
