//! Environment and agent used for tests.
use crate::{
    record::{Record, RecordValue},
    Agent, AgentStep, Env, Policy, Step, TrajectoryBuffer,
};
use anyhow::Result;
use std::{fs, path::Path};

/// Configuration of [`ConstantRewardEnv`].
#[derive(Clone, Debug)]
pub struct ConstantRewardEnvConfig {
    obs_dim: usize,
    episode_len: usize,
    reward: f32,
}

impl Default for ConstantRewardEnvConfig {
    fn default() -> Self {
        Self {
            obs_dim: 1,
            episode_len: 10,
            reward: 1.0,
        }
    }
}

impl ConstantRewardEnvConfig {
    /// Sets the dimension of observations.
    pub fn obs_dim(mut self, v: usize) -> Self {
        self.obs_dim = v;
        self
    }

    /// Sets the number of steps after which the environment terminates.
    pub fn episode_len(mut self, v: usize) -> Self {
        self.episode_len = v;
        self
    }

    /// Sets the reward of every step.
    pub fn reward(mut self, v: f32) -> Self {
        self.reward = v;
        self
    }
}

/// An environment giving a constant reward and terminating after a fixed number of steps.
///
/// The observation is the elapsed fraction of the episode, repeated `obs_dim` times.
pub struct ConstantRewardEnv {
    config: ConstantRewardEnvConfig,
    t: usize,
}

impl ConstantRewardEnv {
    fn obs(&self) -> Vec<f32> {
        vec![self.t as f32 / self.config.episode_len as f32; self.config.obs_dim]
    }
}

impl Env for ConstantRewardEnv {
    type Config = ConstantRewardEnvConfig;
    type Obs = Vec<f32>;
    type Act = Vec<f32>;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            t: 0,
        })
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        self.t += 1;
        let is_terminated = self.t >= self.config.episode_len;
        let step = Step::new(
            self.obs(),
            a.clone(),
            self.config.reward,
            is_terminated,
            false,
            (),
        );
        Ok((step, Record::empty()))
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.t = 0;
        Ok(self.obs())
    }

    fn reset_with_index(&mut self, _ix: usize) -> Result<Self::Obs> {
        self.reset()
    }
}

/// An agent taking zero actions, with zero value estimates and log-probabilities.
///
/// The optimization step only takes the epoch batch from the buffer.
pub struct DummyAgent {
    act_dim: usize,
    train: bool,
    n_opts: usize,
    last_returns: Vec<f32>,
}

impl DummyAgent {
    /// Creates the agent.
    pub fn new(act_dim: usize) -> Self {
        Self {
            act_dim,
            train: true,
            n_opts: 0,
            last_returns: vec![],
        }
    }

    /// The number of optimization steps.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Rewards-to-go of the last epoch batch.
    pub fn last_returns(&self) -> &[f32] {
        &self.last_returns
    }
}

impl<E: Env> Policy<E> for DummyAgent {
    fn sample(&mut self, _obs: &E::Obs) -> Result<E::Act> {
        Ok(vec![0f32; self.act_dim].into())
    }
}

impl<E: Env> Agent<E> for DummyAgent {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn step(&mut self, _obs: &E::Obs, _deterministic: bool) -> Result<AgentStep<E::Act>> {
        Ok(AgentStep {
            act: vec![0f32; self.act_dim].into(),
            value: 0.0,
            logp: 0.0,
        })
    }

    fn value(&mut self, _obs: &E::Obs) -> Result<f32> {
        Ok(0.0)
    }

    fn opt_with_record(&mut self, buffer: &mut TrajectoryBuffer) -> Result<Record> {
        let batch = buffer.get()?;
        self.n_opts += 1;
        let mean_ret = batch.ret.iter().sum::<f32>() / batch.len() as f32;
        self.last_returns = batch.ret;
        Ok(Record::from_slice(&[("mean_ret", RecordValue::Scalar(mean_ret))]))
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_yaml::to_string(&self.n_opts)?)?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.n_opts = serde_yaml::from_str(&fs::read_to_string(path)?)?;
        Ok(())
    }
}
