//! Configuration of [`Trainer`](super::Trainer).
use crate::error::MonopodError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of epochs.
    pub epochs: usize,

    /// The number of environment steps in an epoch.
    pub steps_per_epoch: usize,

    /// The maximum number of steps of an episode.
    pub max_episode_len: usize,

    /// The number of episodes for evaluation after every update, used by
    /// [`Trainer::default_evaluator`](super::Trainer::default_evaluator).
    pub eval_episodes: usize,

    /// Interval of saving model parameters in epochs. `0` disables saving.
    pub save_freq: usize,

    /// Random seed of the environment.
    pub seed: i64,

    /// Where to save the trained model.
    pub model_dir: Option<String>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            steps_per_epoch: 10000,
            max_episode_len: 8000,
            eval_episodes: 1,
            save_freq: 10,
            seed: 42,
            model_dir: None,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of epochs.
    pub fn epochs(mut self, v: usize) -> Self {
        self.epochs = v;
        self
    }

    /// Sets the number of environment steps in an epoch.
    pub fn steps_per_epoch(mut self, v: usize) -> Self {
        self.steps_per_epoch = v;
        self
    }

    /// Sets the maximum length of episodes.
    pub fn max_episode_len(mut self, v: usize) -> Self {
        self.max_episode_len = v;
        self
    }

    /// Sets the number of evaluation episodes.
    pub fn eval_episodes(mut self, v: usize) -> Self {
        self.eval_episodes = v;
        self
    }

    /// Sets the interval of saving in epochs.
    pub fn save_freq(mut self, v: usize) -> Self {
        self.save_freq = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: i64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the directory where the trained model is saved.
    pub fn model_dir(mut self, model_dir: impl Into<String>) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Checks the values of the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.steps_per_epoch == 0 {
            return Err(MonopodError::InvalidConfig("steps_per_epoch must be positive".into()).into());
        }
        if self.max_episode_len == 0 {
            return Err(MonopodError::InvalidConfig("max_episode_len must be positive".into()).into());
        }
        if self.save_freq > 0 && self.model_dir.is_none() {
            return Err(MonopodError::InvalidConfig("save_freq requires model_dir".into()).into());
        }
        Ok(())
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_trainer_config() -> Result<()> {
        let config = TrainerConfig::default()
            .epochs(3)
            .steps_per_epoch(400)
            .max_episode_len(200)
            .model_dir("some/directory");

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer_config.yaml");

        config.save(&path)?;
        let config_ = TrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(TrainerConfig::default().validate().is_err());
        assert!(TrainerConfig::default().save_freq(0).validate().is_ok());
        assert!(TrainerConfig::default()
            .save_freq(0)
            .steps_per_epoch(0)
            .validate()
            .is_err());
        assert!(TrainerConfig::default()
            .model_dir("model")
            .max_episode_len(0)
            .validate()
            .is_err());
    }
}
