use super::PpoConfig;
use crate::actor_critic::ActorCritic;
use anyhow::Result;
use candle_core::Tensor;
use candle_nn::loss::mse;
use log::{debug, trace};
use monopod_core::{
    record::{Record, RecordValue},
    Agent, AgentStep, Env, Obs as _, Policy, TrajectoryBuffer,
};
use std::{marker::PhantomData, path::Path};

/// Clipped surrogate objective of PPO.
///
/// Returns the loss `-mean(min(r * adv, clamp(r, 1 - eps, 1 + eps) * adv))`
/// with `r = exp(logp - logp_old)`, the approximate KL divergence
/// `mean(logp_old - logp)` and the fraction of ratios outside the clip range.
pub fn clipped_surrogate_loss(
    logp: &Tensor,
    logp_old: &Tensor,
    adv: &Tensor,
    clip_ratio: f64,
) -> Result<(Tensor, f32, f32)> {
    let ratio = (logp - logp_old)?.exp()?;
    let clip_adv = (ratio.clamp(1.0 - clip_ratio, 1.0 + clip_ratio)? * adv)?;
    let loss = (&ratio * adv)?.minimum(&clip_adv)?.mean_all()?.neg()?;

    let approx_kl = (logp_old - logp)?.mean_all()?.to_scalar::<f32>()?;
    let ratio = ratio.detach().to_vec1::<f32>()?;
    let (lo, hi) = ((1.0 - clip_ratio) as f32, (1.0 + clip_ratio) as f32);
    let n_clipped = ratio.iter().filter(|r| **r > hi || **r < lo).count();
    let clip_frac = n_clipped as f32 / ratio.len().max(1) as f32;

    Ok((loss, approx_kl, clip_frac))
}

struct PiInfo {
    loss: Tensor,
    approx_kl: f32,
    entropy: f32,
    clip_frac: f32,
}

/// Proximal policy optimization (PPO) agent with the clipped objective.
///
/// Observations and actions are flat `f32` vectors of the dimensions given in
/// [`ActorCriticConfig`](crate::actor_critic::ActorCriticConfig).
pub struct Ppo<E: Env> {
    ac: ActorCritic,
    clip_ratio: f64,
    target_kl: f64,
    train_pi_iters: usize,
    train_v_iters: usize,
    train: bool,
    n_opts: usize,
    phantom: PhantomData<E>,
}

impl<E: Env> Ppo<E> {
    /// Constructs [`Ppo`] agent.
    pub fn build(config: PpoConfig) -> Result<Self> {
        Ok(Self {
            ac: ActorCritic::build(config.actor_critic_config)?,
            clip_ratio: config.clip_ratio,
            target_kl: config.target_kl,
            train_pi_iters: config.train_pi_iters,
            train_v_iters: config.train_v_iters,
            train: config.train,
            n_opts: 0,
            phantom: PhantomData,
        })
    }

    /// The number of optimization steps performed.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Policy and value networks.
    pub fn actor_critic(&self) -> &ActorCritic {
        &self.ac
    }

    fn pi_loss(&self, obs: &Tensor, act: &Tensor, adv: &Tensor, logp_old: &Tensor) -> Result<PiInfo> {
        let dist = self.ac.dist(obs)?;
        let logp = dist.log_prob(act)?;
        let (loss, approx_kl, clip_frac) =
            clipped_surrogate_loss(&logp, logp_old, adv, self.clip_ratio)?;

        // Estimated with -mean(logp) without a closed form
        let entropy = match dist.entropy()? {
            Some(ent) => ent.mean_all()?.to_scalar::<f32>()?,
            None => -logp.mean_all()?.to_scalar::<f32>()?,
        };

        Ok(PiInfo {
            loss,
            approx_kl,
            entropy,
            clip_frac,
        })
    }

    fn v_loss(&self, obs: &Tensor, ret: &Tensor) -> Result<Tensor> {
        Ok(mse(&self.ac.value_tensor(obs)?, ret)?)
    }

    fn opt_(&mut self, buffer: &mut TrajectoryBuffer) -> Result<Record> {
        let batch = buffer.get()?;
        let obs = self.ac.obs_tensor(&batch.obs)?;
        let act = self.ac.act_tensor(&batch.act)?;
        let adv = self.ac.scalar_tensor(&batch.adv)?;
        let ret = self.ac.scalar_tensor(&batch.ret)?;
        let logp_old = self.ac.scalar_tensor(&batch.logp)?;

        let pi_info_old = self.pi_loss(&obs, &act, &adv, &logp_old)?;
        let loss_pi_old = pi_info_old.loss.to_scalar::<f32>()?;
        let loss_v_old = self.v_loss(&obs, &ret)?.to_scalar::<f32>()?;

        let (mut loss_pi, mut approx_kl, mut clip_frac) =
            (loss_pi_old, pi_info_old.approx_kl, pi_info_old.clip_frac);
        trace!("update policy");
        for _ in 0..self.train_pi_iters {
            let info = self.pi_loss(&obs, &act, &adv, &logp_old)?;
            self.ac.pi_backward_step(&info.loss)?;
            loss_pi = info.loss.to_scalar::<f32>()?;
            approx_kl = info.approx_kl;
            clip_frac = info.clip_frac;
        }
        if approx_kl as f64 > 1.5 * self.target_kl {
            debug!(
                "Approximate KL {} exceeds 1.5 * target_kl = {}",
                approx_kl,
                1.5 * self.target_kl
            );
        }

        let mut loss_v = loss_v_old;
        trace!("update value function");
        for _ in 0..self.train_v_iters {
            let loss = self.v_loss(&obs, &ret)?;
            self.ac.vf_backward_step(&loss)?;
            loss_v = loss.to_scalar::<f32>()?;
        }

        self.n_opts += 1;

        Ok(Record::from_slice(&[
            ("loss_pi", RecordValue::Scalar(loss_pi_old)),
            ("loss_v", RecordValue::Scalar(loss_v_old)),
            ("delta_loss_pi", RecordValue::Scalar(loss_pi - loss_pi_old)),
            ("delta_loss_v", RecordValue::Scalar(loss_v - loss_v_old)),
            ("approx_kl", RecordValue::Scalar(approx_kl)),
            ("entropy", RecordValue::Scalar(pi_info_old.entropy)),
            ("clip_frac", RecordValue::Scalar(clip_frac)),
            ("target_kl", RecordValue::Scalar(self.target_kl as f32)),
        ]))
    }
}

impl<E: Env> Policy<E> for Ppo<E> {
    /// Samples an action in training mode, takes the mode of the distribution otherwise.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let (act, _, _) = self.ac.step(obs.as_slice(), !self.train)?;
        Ok(act.into())
    }
}

impl<E: Env> Agent<E> for Ppo<E> {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn step(&mut self, obs: &E::Obs, deterministic: bool) -> Result<AgentStep<E::Act>> {
        let (act, value, logp) = self.ac.step(obs.as_slice(), deterministic)?;
        Ok(AgentStep {
            act: act.into(),
            value,
            logp,
        })
    }

    fn value(&mut self, obs: &E::Obs) -> Result<f32> {
        self.ac.value(obs.as_slice())
    }

    fn opt_with_record(&mut self, buffer: &mut TrajectoryBuffer) -> Result<Record> {
        self.opt_(buffer)
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        self.ac.save(path)
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.ac.load(path)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{actor_critic::ActorCriticConfig, distribution::DistributionKind};
    use candle_core::Device;
    use monopod_core::{
        dummy::{ConstantRewardEnv, ConstantRewardEnvConfig},
        TrajectoryBufferConfig,
    };

    fn tensor(xs: &[f32]) -> Result<Tensor> {
        Ok(Tensor::from_slice(xs, (xs.len(),), &Device::Cpu)?)
    }

    #[test]
    fn test_clipped_surrogate_loss() -> Result<()> {
        // ratios: 1.0, e^0.5 (clipped for positive advantage), e^-0.5 (clipped for negative)
        let logp_old = tensor(&[0.0, 0.0, 0.0])?;
        let logp = tensor(&[0.0, 0.5, -0.5])?;
        let adv = tensor(&[1.0, 2.0, -1.0])?;
        let (loss, approx_kl, clip_frac) = clipped_surrogate_loss(&logp, &logp_old, &adv, 0.2)?;

        // -mean(1.0, 1.2 * 2.0, 0.8 * -1.0)
        let expected = -(1.0 + 2.4 - 0.8) / 3.0;
        assert!((loss.to_scalar::<f32>()? - expected).abs() < 1e-5);
        assert!(approx_kl.abs() < 1e-6);
        assert!((clip_frac - 2.0 / 3.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_unclipped_objective_not_exceeded() -> Result<()> {
        let logp_old = tensor(&[-1.0, -2.0, -0.5, -1.5])?;
        let logp = tensor(&[-0.2, -2.5, -0.5, -0.1])?;
        let adv = tensor(&[0.7, -1.3, 2.0, -0.4])?;
        let (loss, _, _) = clipped_surrogate_loss(&logp, &logp_old, &adv, 0.2)?;
        let unclipped = ((logp - logp_old)?.exp()? * adv)?.mean_all()?.to_scalar::<f32>()?;

        assert!(-loss.to_scalar::<f32>()? <= unclipped + 1e-6);
        Ok(())
    }

    fn fill_buffer(
        agent: &mut Ppo<ConstantRewardEnv>,
        env: &mut ConstantRewardEnv,
        buffer: &mut TrajectoryBuffer,
    ) -> Result<()> {
        let mut obs = env.reset()?;
        while !buffer.is_full() {
            let s = Agent::<ConstantRewardEnv>::step(agent, &obs, false)?;
            let (step, _) = env.step(&s.act)?;
            buffer.store(&obs, &s.act, step.reward, s.value, s.logp)?;
            let done = step.is_done();
            obs = step.obs;
            if done {
                buffer.finish_path(0.0);
                obs = env.reset()?;
            }
        }
        buffer.finish_path(Agent::<ConstantRewardEnv>::value(agent, &obs)?);
        Ok(())
    }

    #[test]
    fn test_opt_with_record() -> Result<()> {
        let env_config = ConstantRewardEnvConfig::default().obs_dim(2).episode_len(4);
        let mut env = ConstantRewardEnv::build(&env_config, 0)?;
        let config = PpoConfig::default()
            .train_pi_iters(5)
            .train_v_iters(20)
            .actor_critic_config(
                ActorCriticConfig::default()
                    .obs_dim(2)
                    .act_dim(1)
                    .hidden_sizes(vec![8])
                    .distribution(DistributionKind::squashed_diag_gaussian()),
            );
        let mut agent = Ppo::<ConstantRewardEnv>::build(config)?;
        let mut buffer = TrajectoryBuffer::build(
            &TrajectoryBufferConfig::default()
                .capacity(16)
                .obs_dim(2)
                .act_dim(1),
        )?;

        fill_buffer(&mut agent, &mut env, &mut buffer)?;
        let record = Agent::<ConstantRewardEnv>::opt_with_record(&mut agent, &mut buffer)?;

        for key in [
            "loss_pi",
            "loss_v",
            "delta_loss_pi",
            "delta_loss_v",
            "approx_kl",
            "entropy",
            "clip_frac",
        ] {
            assert!(record.get_scalar(key)?.is_finite(), "{}", key);
        }
        assert!((record.get_scalar("target_kl")? - 0.01).abs() < 1e-6);
        // Both losses go down within an update
        assert!(record.get_scalar("delta_loss_pi")? < 0.0);
        assert!(record.get_scalar("delta_loss_v")? < 0.0);
        assert!(buffer.is_empty());
        assert_eq!(agent.n_opts(), 1);
        Ok(())
    }

    #[test]
    fn test_sample_follows_mode() -> Result<()> {
        let config = PpoConfig::default().actor_critic_config(
            ActorCriticConfig::default().obs_dim(2).act_dim(3),
        );
        let mut agent = Ppo::<ConstantRewardEnv>::build(config)?;
        let obs = vec![0.5f32, 0.25];

        Agent::<ConstantRewardEnv>::eval(&mut agent);
        let a1 = Policy::<ConstantRewardEnv>::sample(&mut agent, &obs)?;
        let a2 = Policy::<ConstantRewardEnv>::sample(&mut agent, &obs)?;
        assert_eq!(a1, a2);

        Agent::<ConstantRewardEnv>::train(&mut agent);
        let a3 = Policy::<ConstantRewardEnv>::sample(&mut agent, &obs)?;
        assert_ne!(a1, a3);
        assert_eq!(a3.len(), 3);
        Ok(())
    }
}
