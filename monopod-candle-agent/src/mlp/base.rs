use super::{mlp_forward, MlpConfig};
use crate::model::SubModel1;
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::{linear, Linear, VarBuilder};

/// Returns vector of linear modules from [`MlpConfig`].
fn create_linear_layers(prefix: &str, vs: VarBuilder, config: &MlpConfig) -> Result<Vec<Linear>> {
    let dims: Vec<usize> = std::iter::once(config.in_dim)
        .chain(config.units.iter().copied())
        .chain(std::iter::once(config.out_dim))
        .collect();
    let vs = vs.pp(prefix);

    dims.windows(2)
        .enumerate()
        .map(|(i, d)| Ok(linear(d[0], d[1], vs.pp(format!("ln{}", i)))?))
        .collect()
}

/// Multilayer perceptron.
///
/// The hidden layers and the output layer have their own activation functions.
/// An empty `units` makes a single linear layer.
pub struct Mlp {
    config: MlpConfig,
    device: Device,
    layers: Vec<Linear>,
}

impl SubModel1 for Mlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        let xs = xs.to_device(&self.device)?;
        mlp_forward(
            xs,
            &self.layers,
            &self.config.activation,
            &self.config.activation_out,
        )
    }

    fn build(vs: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vs.device().clone();
        let layers = create_linear_layers("mlp", vs, &config)?;

        Ok(Mlp {
            config,
            device,
            layers,
        })
    }
}
