//! Configuration of PPO agent.
use crate::actor_critic::ActorCriticConfig;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Ppo`](super::Ppo).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PpoConfig {
    /// Bound of the deviation of the probability ratio from 1.
    pub clip_ratio: f64,

    /// Target of the approximate KL divergence, reported only.
    pub target_kl: f64,

    /// Number of gradient steps on the policy per epoch.
    pub train_pi_iters: usize,

    /// Number of gradient steps on the value function per epoch.
    pub train_v_iters: usize,

    /// Whether the agent starts in training mode.
    pub train: bool,

    /// Networks and optimizers.
    pub actor_critic_config: ActorCriticConfig,
}

impl Default for PpoConfig {
    fn default() -> Self {
        Self {
            clip_ratio: 0.2,
            target_kl: 0.01,
            train_pi_iters: 80,
            train_v_iters: 80,
            train: true,
            actor_critic_config: ActorCriticConfig::default(),
        }
    }
}

impl PpoConfig {
    /// Sets the clip ratio.
    pub fn clip_ratio(mut self, v: f64) -> Self {
        self.clip_ratio = v;
        self
    }

    /// Sets the target KL divergence.
    pub fn target_kl(mut self, v: f64) -> Self {
        self.target_kl = v;
        self
    }

    /// Sets the number of policy steps per epoch.
    pub fn train_pi_iters(mut self, v: usize) -> Self {
        self.train_pi_iters = v;
        self
    }

    /// Sets the number of value function steps per epoch.
    pub fn train_v_iters(mut self, v: usize) -> Self {
        self.train_v_iters = v;
        self
    }

    /// Sets the configuration of the networks.
    pub fn actor_critic_config(mut self, v: ActorCriticConfig) -> Self {
        self.actor_critic_config = v;
        self
    }

    /// Constructs [`PpoConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`PpoConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::distribution::DistributionKind;
    use tempdir::TempDir;

    #[test]
    fn test_serde_ppo_config() -> Result<()> {
        let config = PpoConfig::default()
            .clip_ratio(0.1)
            .train_pi_iters(10)
            .actor_critic_config(
                ActorCriticConfig::default()
                    .obs_dim(4)
                    .act_dim(1)
                    .distribution(DistributionKind::beta_mean_std()),
            );

        let dir = TempDir::new("ppo_config")?;
        let path = dir.path().join("ppo_config.yaml");
        config.save(&path)?;
        let config_ = PpoConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
