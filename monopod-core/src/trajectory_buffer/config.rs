//! Configuration of [`TrajectoryBuffer`](super::TrajectoryBuffer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`TrajectoryBuffer`](super::TrajectoryBuffer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrajectoryBufferConfig {
    /// The number of transitions in an epoch.
    pub capacity: usize,

    /// Dimension of observations.
    pub obs_dim: usize,

    /// Dimension of actions.
    pub act_dim: usize,

    /// Discount factor.
    pub gamma: f32,

    /// Lambda of GAE-Lambda.
    pub lambda: f32,

    /// If `true`, advantages in the epoch batch are standardized.
    #[serde(default)]
    pub normalize_advantages: bool,
}

impl Default for TrajectoryBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 10000,
            obs_dim: 0,
            act_dim: 0,
            gamma: 0.99,
            lambda: 0.97,
            normalize_advantages: false,
        }
    }
}

impl TrajectoryBufferConfig {
    /// Sets the capacity, which should be the number of environment steps per epoch.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

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

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// Sets lambda of GAE-Lambda.
    pub fn lambda(mut self, v: f32) -> Self {
        self.lambda = v;
        self
    }

    /// Enables standardization of advantages.
    pub fn normalize_advantages(mut self, v: bool) -> Self {
        self.normalize_advantages = v;
        self
    }

    /// Constructs [`TrajectoryBufferConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrajectoryBufferConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
