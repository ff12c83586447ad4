use crate::{distribution::DistributionKind, opt::OptimizerConfig, Activation, Device};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`ActorCritic`](super::ActorCritic).
pub struct ActorCriticConfig {
    /// Dimension of observations.
    pub obs_dim: usize,

    /// Dimension of actions.
    pub act_dim: usize,

    /// Sizes of the hidden layers, shared by the policy and the value function.
    pub hidden_sizes: Vec<usize>,

    /// Activation function of the hidden layers.
    pub activation: Activation,

    /// Action distribution of the policy.
    pub distribution: DistributionKind,

    /// Optimizer of the policy parameters.
    pub pi_opt_config: OptimizerConfig,

    /// Optimizer of the value function parameters.
    pub vf_opt_config: OptimizerConfig,

    /// Seed of the parameter initialization and action sampling.
    pub seed: u64,

    /// Device, CPU if not given.
    pub device: Option<Device>,
}

impl Default for ActorCriticConfig {
    fn default() -> Self {
        Self {
            obs_dim: 0,
            act_dim: 0,
            hidden_sizes: vec![64, 64],
            activation: Activation::Tanh,
            distribution: DistributionKind::default(),
            pi_opt_config: OptimizerConfig::Adam { lr: 3e-4 },
            vf_opt_config: OptimizerConfig::Adam { lr: 1e-3 },
            seed: 42,
            device: None,
        }
    }
}

impl ActorCriticConfig {
    /// Sets the dimension of observations.
    pub fn obs_dim(mut self, v: usize) -> Self {
        self.obs_dim = v;
        self
    }

    /// Sets the dimension of actions.
    pub fn act_dim(mut self, v: usize) -> Self {
        self.act_dim = v;
        self
    }

    /// Sets the sizes of the hidden layers.
    pub fn hidden_sizes(mut self, v: Vec<usize>) -> Self {
        self.hidden_sizes = v;
        self
    }

    /// Sets the activation function of the hidden layers.
    pub fn activation(mut self, v: Activation) -> Self {
        self.activation = v;
        self
    }

    /// Sets the action distribution.
    pub fn distribution(mut self, v: DistributionKind) -> Self {
        self.distribution = v;
        self
    }

    /// Sets the optimizer of the policy.
    pub fn pi_opt_config(mut self, v: OptimizerConfig) -> Self {
        self.pi_opt_config = v;
        self
    }

    /// Sets the optimizer of the value function.
    pub fn vf_opt_config(mut self, v: OptimizerConfig) -> Self {
        self.vf_opt_config = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = Some(v);
        self
    }

    /// Constructs [`ActorCriticConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ActorCriticConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
