//! Train [`Agent`].
mod config;
mod sampler;
use crate::{
    error::MonopodError,
    record::{
        AggregateRecorder,
        RecordValue::{DateTime, Scalar},
    },
    Agent, DefaultEvaluator, Env, Evaluator, TrajectoryBuffer, TrajectoryBufferConfig,
};
use anyhow::Result;
use chrono::Local;
pub use config::TrainerConfig;
use log::{info, warn};
pub use sampler::{EpisodeEnd, Sampler};
use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the epoch loop of on-policy training.
///
/// # Training loop
///
/// 0. Given an agent implementing [`Agent`], a recorder implementing
///    [`AggregateRecorder`] and an evaluator implementing [`Evaluator`].
/// 1. Build [`Env`] with `seed` and a [`TrajectoryBuffer`] with
///    `capacity == steps_per_epoch`.
/// 2. For `epoch` in `0..epochs`:
///     1. Rollout: [`Sampler::sample_epoch`] fills the buffer, finishing a
///        trajectory segment at every [`EpisodeEnd`].
///     2. If `save_freq > 0` and `epoch % save_freq == 0`, the parameters are
///        saved in `(model_dir)/epoch_(epoch).safetensors`.
///     3. Update: [`Agent::opt_with_record`] consumes the epoch batch.
///     4. Evaluation: the agent is switched to evaluation mode, evaluated with
///        the evaluator and switched back to training mode.
///     5. The record of the epoch, with its wall-clock `datetime`, is stored
///        in the recorder and flushed with `epoch` as its step.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|"Env::Act"|B[Env]
///     B -->|"Env::Obs"|A
///     A -->|"value, logp"|C[TrajectoryBuffer]
///     B -->|"reward"|C
///     C -->|EpochBatch|A
/// ```
pub struct Trainer<E: Env> {
    /// Configuration of the environment for training.
    env_config: E::Config,

    /// Configuration of the trajectory buffer.
    buffer_config: TrajectoryBufferConfig,

    config: TrainerConfig,
}

impl<E: Env> Trainer<E> {
    /// Constructs a trainer.
    ///
    /// Fails if the configuration is malformed or the capacity of the buffer
    /// differs from `steps_per_epoch`.
    pub fn build(
        config: TrainerConfig,
        env_config: E::Config,
        buffer_config: TrajectoryBufferConfig,
    ) -> Result<Self> {
        config.validate()?;
        if buffer_config.capacity != config.steps_per_epoch {
            return Err(MonopodError::InvalidConfig(format!(
                "buffer capacity ({}) must be equal to steps_per_epoch ({})",
                buffer_config.capacity, config.steps_per_epoch
            ))
            .into());
        }

        Ok(Self {
            env_config,
            buffer_config,
            config,
        })
    }

    /// Builds a [`DefaultEvaluator`] running `eval_episodes` episodes capped at
    /// `max_episode_len` steps.
    ///
    /// The evaluation environment is seeded with `seed + 1`, so its initial
    /// states differ from those of the training environment.
    pub fn default_evaluator(&self) -> Result<DefaultEvaluator<E>> {
        DefaultEvaluator::new(
            &self.env_config,
            self.config.seed + 1,
            self.config.eval_episodes,
            self.config.max_episode_len,
        )
    }

    /// Path of the checkpoint saved at `epoch`.
    pub fn checkpoint_path(model_dir: impl AsRef<Path>, epoch: usize) -> PathBuf {
        model_dir
            .as_ref()
            .join(format!("epoch_{}.safetensors", epoch))
    }

    fn save_model<A: Agent<E>>(agent: &A, model_dir: &str, epoch: usize) -> Result<()> {
        std::fs::create_dir_all(model_dir)?;
        let path = Self::checkpoint_path(model_dir, epoch);
        match agent.save_params(&path) {
            Ok(()) => {
                info!("Saved the model in {:?}", &path);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to save the model in {:?}", &path);
                Err(e)
            }
        }
    }

    /// Train the agent.
    pub fn train<A, D>(
        &mut self,
        agent: &mut A,
        recorder: &mut Box<dyn AggregateRecorder>,
        evaluator: &mut D,
    ) -> Result<()>
    where
        A: Agent<E>,
        D: Evaluator<E>,
    {
        let env = E::build(&self.env_config, self.config.seed)?;
        let mut buffer = TrajectoryBuffer::build(&self.buffer_config)?;
        let mut sampler = Sampler::new(env, self.config.max_episode_len);
        agent.train();

        for epoch in 0..self.config.epochs {
            let timer = SystemTime::now();

            // Rollout
            let mut record = sampler.sample_epoch(agent, &mut buffer, recorder.as_mut())?;
            let sec_rollout = timer.elapsed()?.as_secs_f32();

            // Save the parameters before the update of this epoch
            if self.config.save_freq > 0 && epoch % self.config.save_freq == 0 {
                if let Some(model_dir) = self.config.model_dir.as_ref() {
                    Self::save_model(agent, model_dir, epoch)?;
                }
            }

            // Update
            let timer = SystemTime::now();
            record.merge_inplace(agent.opt_with_record(&mut buffer)?);
            let sec_update = timer.elapsed()?.as_secs_f32();

            // Evaluation
            agent.eval();
            let eval_record = evaluator.evaluate(agent);
            agent.train();
            let eval_record = eval_record?;
            if let Ok(eval_return) = eval_record.get_scalar("eval_return") {
                info!("Epoch {}: eval_return = {}", epoch, eval_return);
            }
            record.merge_inplace(eval_record);

            record.insert("epoch", Scalar(epoch as _));
            record.insert("datetime", DateTime(Local::now()));
            record.insert("sec_rollout", Scalar(sec_rollout));
            record.insert("sec_update", Scalar(sec_update));
            recorder.store(record);
            recorder.flush(epoch as _);
        }

        Ok(())
    }
}
