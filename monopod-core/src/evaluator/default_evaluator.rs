//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{
    record::{Record, RecordValue},
    Agent, Env,
};
use anyhow::Result;
use log::debug;

/// Runs a fixed number of episodes and reports the average return as `eval_return`.
///
/// Episodes end when the environment terminates or truncates, or after
/// `max_episode_len` steps. Actions are taken with [`Policy::sample`], which
/// returns the mode of the action distribution when the agent is in
/// evaluation mode.
///
/// ```ignore
/// let mut evaluator = DefaultEvaluator::new(&env_config, 43, 5, 1000)?;
/// let record = evaluator.evaluate(&mut agent)?;
/// println!("Average return: {}", record.get_scalar("eval_return")?);
/// ```
///
/// [`Policy::sample`]: crate::Policy::sample
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    max_episode_len: usize,
    env: E,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<A>(&mut self, agent: &mut A) -> Result<Record>
    where
        A: Agent<E>,
    {
        let mut r_total = 0f32;
        let mut len_total = 0usize;

        for ix in 0..self.n_episodes {
            let mut prev_obs = self.env.reset_with_index(ix)?;
            let mut r_episode = 0f32;

            for t in 1..=self.max_episode_len {
                let act = agent.sample(&prev_obs)?;
                let (step, _) = self.env.step(&act)?;
                r_episode += step.reward;
                len_total += 1;
                if step.is_done() || t == self.max_episode_len {
                    break;
                }
                prev_obs = step.obs;
            }

            debug!("Evaluation episode {}: return = {}", ix, r_episode);
            r_total += r_episode;
        }

        let n = self.n_episodes.max(1) as f32;
        Ok(Record::from_slice(&[
            ("eval_return", RecordValue::Scalar(r_total / n)),
            ("eval_episode_length", RecordValue::Scalar(len_total as f32 / n)),
        ]))
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    ///
    /// * `config` - Configuration for the environment
    /// * `seed` - Random seed for environment initialization
    /// * `n_episodes` - Number of episodes to run during evaluation
    /// * `max_episode_len` - Maximum number of steps in an episode
    pub fn new(
        config: &E::Config,
        seed: i64,
        n_episodes: usize,
        max_episode_len: usize,
    ) -> Result<Self> {
        Ok(Self {
            n_episodes,
            max_episode_len,
            env: E::build(config, seed)?,
        })
    }
}
