//! Rollout of an epoch into the trajectory buffer.
use crate::{
    record::{Record, RecordValue, Recorder},
    Act as _, Agent, Env, Obs as _, TrajectoryBuffer,
};
use anyhow::Result;
use log::{trace, warn};
use std::fmt;

/// How a trajectory segment ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EpisodeEnd {
    /// The environment reported termination. The segment is not bootstrapped.
    Terminal,

    /// The episode reached the maximum length or was truncated by the environment.
    TimeLimit,

    /// The epoch ended while the episode was running.
    EpochBoundary,
}

impl EpisodeEnd {
    /// Classifies the end of a segment after an environment step.
    ///
    /// A time limit takes priority over termination, which takes priority
    /// over the end of the epoch. Returns `None` if the segment continues.
    pub fn classify(
        is_terminated: bool,
        is_truncated: bool,
        ep_len: usize,
        max_episode_len: usize,
        epoch_ended: bool,
    ) -> Option<Self> {
        if ep_len >= max_episode_len || is_truncated {
            Some(Self::TimeLimit)
        } else if is_terminated {
            Some(Self::Terminal)
        } else if epoch_ended {
            Some(Self::EpochBoundary)
        } else {
            None
        }
    }

    /// Returns `true` if the value beyond the cut is estimated by the critic.
    pub fn bootstraps(&self) -> bool {
        !matches!(self, Self::Terminal)
    }
}

impl fmt::Display for EpisodeEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Terminal => "terminal",
            Self::TimeLimit => "time_limit",
            Self::EpochBoundary => "epoch_boundary",
        };
        write!(f, "{}", s)
    }
}

/// Collects transitions of an epoch from the environment.
///
/// Every completed episode (terminal or time limit) is written to the recorder
/// with its return and length. A segment cut at the epoch boundary is not an
/// episode and is not recorded; the environment is reset in either case, so
/// every epoch starts with a fresh episode.
pub struct Sampler<E: Env> {
    env: E,
    max_episode_len: usize,
    obs: Option<E::Obs>,
    ep_ret: f32,
    ep_len: usize,
    n_episodes: usize,
    env_steps: usize,
}

impl<E: Env> Sampler<E> {
    /// Creates a sampler.
    pub fn new(env: E, max_episode_len: usize) -> Self {
        Self {
            env,
            max_episode_len,
            obs: None,
            ep_ret: 0.0,
            ep_len: 0,
            n_episodes: 0,
            env_steps: 0,
        }
    }

    /// The number of environment steps since the sampler was created.
    pub fn env_steps(&self) -> usize {
        self.env_steps
    }

    /// The number of completed episodes since the sampler was created.
    pub fn n_episodes(&self) -> usize {
        self.n_episodes
    }

    /// Fills `buffer` with transitions, finishing a trajectory segment at every
    /// episode end and at the end of the epoch.
    ///
    /// Returns a record with `n_episodes` and `mean_episode_return` over the
    /// episodes completed in the epoch, and the total `env_steps`.
    pub fn sample_epoch<A, R>(
        &mut self,
        agent: &mut A,
        buffer: &mut TrajectoryBuffer,
        recorder: &mut R,
    ) -> Result<Record>
    where
        A: Agent<E>,
        R: Recorder + ?Sized,
    {
        let steps = buffer.capacity() - buffer.len();
        let mut returns = vec![];

        for t in 0..steps {
            let obs = match self.obs.take() {
                Some(obs) => obs,
                None => self.env.reset()?,
            };

            let out = agent.step(&obs, false)?;
            let (step, _) = self.env.step(&out.act)?;
            buffer.store(obs.as_slice(), out.act.as_slice(), step.reward, out.value, out.logp)?;
            self.ep_ret += step.reward;
            self.ep_len += 1;
            self.env_steps += 1;

            let end = EpisodeEnd::classify(
                step.is_terminated,
                step.is_truncated,
                self.ep_len,
                self.max_episode_len,
                t == steps - 1,
            );

            match end {
                None => self.obs = Some(step.obs),
                Some(end) => {
                    let last_val = match end.bootstraps() {
                        true => agent.value(&step.obs)?,
                        false => 0.0,
                    };
                    buffer.finish_path(last_val);

                    if end == EpisodeEnd::EpochBoundary {
                        warn!(
                            "Trajectory cut off by epoch at {} steps, bootstrapped with {}",
                            self.ep_len, last_val
                        );
                    } else {
                        trace!(
                            "Episode {} ended ({}), return = {}, length = {}",
                            self.n_episodes,
                            end,
                            self.ep_ret,
                            self.ep_len
                        );
                        recorder.write(Record::from_slice(&[
                            ("episode", RecordValue::Scalar(self.n_episodes as _)),
                            ("episode_return", RecordValue::Scalar(self.ep_ret)),
                            ("episode_length", RecordValue::Scalar(self.ep_len as _)),
                            ("episode_end", RecordValue::String(end.to_string())),
                            ("env_steps", RecordValue::Scalar(self.env_steps as _)),
                        ]));
                        returns.push(self.ep_ret);
                        self.n_episodes += 1;
                    }

                    self.obs = None;
                    self.ep_ret = 0.0;
                    self.ep_len = 0;
                }
            }
        }

        let mut record = Record::from_slice(&[
            ("n_episodes", RecordValue::Scalar(returns.len() as _)),
            ("env_steps", RecordValue::Scalar(self.env_steps as _)),
        ]);
        if !returns.is_empty() {
            let mean = returns.iter().sum::<f32>() / returns.len() as f32;
            record.insert("mean_episode_return", RecordValue::Scalar(mean));
        }

        Ok(record)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        dummy::{ConstantRewardEnv, ConstantRewardEnvConfig},
        record::BufferedRecorder,
        AgentStep, Policy, TrajectoryBufferConfig,
    };
    use std::path::Path;

    /// Takes zero actions and estimates every state at a constant value.
    struct ConstantValueAgent(f32);

    impl Policy<ConstantRewardEnv> for ConstantValueAgent {
        fn sample(&mut self, _obs: &Vec<f32>) -> Result<Vec<f32>> {
            Ok(vec![0.0])
        }
    }

    impl Agent<ConstantRewardEnv> for ConstantValueAgent {
        fn train(&mut self) {}

        fn eval(&mut self) {}

        fn is_train(&self) -> bool {
            true
        }

        fn step(&mut self, _obs: &Vec<f32>, _deterministic: bool) -> Result<AgentStep<Vec<f32>>> {
            Ok(AgentStep {
                act: vec![0.0],
                value: self.0,
                logp: 0.0,
            })
        }

        fn value(&mut self, _obs: &Vec<f32>) -> Result<f32> {
            Ok(self.0)
        }

        fn opt_with_record(&mut self, _buffer: &mut TrajectoryBuffer) -> Result<Record> {
            Ok(Record::empty())
        }

        fn save_params(&self, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn load_params(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_terminal_and_epoch_boundary() -> Result<()> {
        let env_config = ConstantRewardEnvConfig::default().episode_len(3).obs_dim(1);
        let env = ConstantRewardEnv::build(&env_config, 0)?;
        let mut sampler = Sampler::new(env, 100);
        let mut agent = ConstantValueAgent(10.0);
        let mut recorder = BufferedRecorder::new();
        let buffer_config = TrajectoryBufferConfig::default()
            .capacity(5)
            .obs_dim(1)
            .act_dim(1)
            .gamma(1.0)
            .lambda(1.0);
        let mut buffer = TrajectoryBuffer::build(&buffer_config)?;

        let record = sampler.sample_epoch(&mut agent, &mut buffer, &mut recorder)?;
        assert_eq!(record.get_scalar("n_episodes")?, 1.0);
        assert_eq!(record.get_scalar("env_steps")?, 5.0);
        assert_eq!(record.get_scalar("mean_episode_return")?, 3.0);

        // Only the terminated episode is written
        let episodes = recorder.iter().collect::<Vec<_>>();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].get_string("episode_end")?, "terminal");
        assert_eq!(episodes[0].get_scalar("episode_length")?, 3.0);

        // Zero beyond the terminal state, the critic's estimate beyond the cut
        let batch = buffer.get()?;
        assert_eq!(batch.ret, vec![3.0, 2.0, 1.0, 12.0, 11.0]);
        assert_eq!(sampler.n_episodes(), 1);
        Ok(())
    }

    #[test]
    fn test_classify() {
        use EpisodeEnd::*;
        assert_eq!(EpisodeEnd::classify(false, false, 3, 10, false), None);
        assert_eq!(EpisodeEnd::classify(true, false, 3, 10, false), Some(Terminal));
        assert_eq!(EpisodeEnd::classify(false, true, 3, 10, false), Some(TimeLimit));
        assert_eq!(EpisodeEnd::classify(false, false, 10, 10, false), Some(TimeLimit));
        assert_eq!(EpisodeEnd::classify(true, false, 10, 10, true), Some(TimeLimit));
        assert_eq!(EpisodeEnd::classify(true, false, 3, 10, true), Some(Terminal));
        assert_eq!(EpisodeEnd::classify(false, false, 3, 10, true), Some(EpochBoundary));
        assert!(!Terminal.bootstraps());
        assert!(TimeLimit.bootstraps());
        assert!(EpochBoundary.bootstraps());
    }
}
