use super::ActorCriticConfig;
use crate::{
    distribution::{ActionDistribution, DistributionKind, PolicyHead},
    mlp::{Mlp, MlpConfig},
    model::SubModel1,
    opt::Optimizer,
    util::init_params,
    Activation,
};
use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor, Var, D};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use monopod_core::error::MonopodError;
use rand::{rngs::StdRng, SeedableRng};
use std::path::Path;

/// Returns the variables whose names start with `prefix`, sorted by name.
fn vars_with_prefix(varmap: &VarMap, prefix: &str) -> Result<Vec<Var>> {
    let data = varmap
        .data()
        .lock()
        .map_err(|e| anyhow!("Failed to lock varmap: {}", e))?;
    let mut vars: Vec<(&String, &Var)> = data
        .iter()
        .filter(|(name, _)| name.starts_with(prefix))
        .collect();
    vars.sort_by(|a, b| a.0.cmp(b.0));
    Ok(vars.into_iter().map(|(_, v)| v.clone()).collect())
}

/// Policy and value function of a PPO agent.
///
/// Both networks live in one [`VarMap`], under the prefixes `pi` and `vf`,
/// and are trained with separate optimizers. The random number generator
/// used for initialization is also used for sampling actions.
pub struct ActorCritic {
    device: Device,
    varmap: VarMap,
    obs_dim: usize,
    act_dim: usize,
    kind: DistributionKind,
    pi: PolicyHead,
    vf: Mlp,
    pi_opt: Optimizer,
    vf_opt: Optimizer,
    rng: StdRng,
}

impl ActorCritic {
    /// Constructs [`ActorCritic`].
    pub fn build(config: ActorCriticConfig) -> Result<Self> {
        if config.obs_dim == 0 || config.act_dim == 0 {
            return Err(MonopodError::InvalidConfig(format!(
                "obs_dim and act_dim must be positive, got {} and {}",
                config.obs_dim, config.act_dim
            ))
            .into());
        }

        let device = config.device.unwrap_or_default().to_candle()?;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let pi = config.distribution.build_output_layer(
            vb.pp("pi"),
            config.obs_dim,
            config.act_dim,
            &config.hidden_sizes,
            config.activation,
        )?;
        let vf = Mlp::build(
            vb.pp("vf"),
            MlpConfig::new(
                config.obs_dim,
                config.hidden_sizes.clone(),
                1,
                config.activation,
                Activation::Identity,
            ),
        )?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        init_params(&varmap, &mut rng)?;

        let pi_opt = config
            .pi_opt_config
            .build(vars_with_prefix(&varmap, "pi.")?)?;
        let vf_opt = config
            .vf_opt_config
            .build(vars_with_prefix(&varmap, "vf.")?)?;

        Ok(Self {
            device,
            varmap,
            obs_dim: config.obs_dim,
            act_dim: config.act_dim,
            kind: config.distribution,
            pi,
            vf,
            pi_opt,
            vf_opt,
            rng,
        })
    }

    /// Dimension of actions.
    pub fn act_dim(&self) -> usize {
        self.act_dim
    }

    /// Makes a batch of observations, `(n, obs_dim)`, from a flat slice.
    pub fn obs_tensor(&self, obs: &[f32]) -> Result<Tensor> {
        if obs.is_empty() || obs.len() % self.obs_dim != 0 {
            return Err(MonopodError::ShapeMismatch {
                name: "obs".into(),
                expected: self.obs_dim,
                actual: obs.len(),
            }
            .into());
        }
        let n = obs.len() / self.obs_dim;
        Ok(Tensor::from_slice(obs, (n, self.obs_dim), &self.device)?)
    }

    /// Makes a batch of actions, `(n, act_dim)`, from a flat slice.
    pub fn act_tensor(&self, act: &[f32]) -> Result<Tensor> {
        if act.is_empty() || act.len() % self.act_dim != 0 {
            return Err(MonopodError::ShapeMismatch {
                name: "act".into(),
                expected: self.act_dim,
                actual: act.len(),
            }
            .into());
        }
        let n = act.len() / self.act_dim;
        Ok(Tensor::from_slice(act, (n, self.act_dim), &self.device)?)
    }

    /// Makes a tensor of per-sample values, `(n,)`.
    pub fn scalar_tensor(&self, xs: &[f32]) -> Result<Tensor> {
        Ok(Tensor::from_slice(xs, (xs.len(),), &self.device)?)
    }

    /// Action distribution for a batch of observations.
    pub fn dist(&self, obs: &Tensor) -> Result<ActionDistribution> {
        ActionDistribution::bind(&self.kind, self.pi.forward(obs)?)
    }

    /// Value estimates for a batch of observations, `(n,)`.
    pub fn value_tensor(&self, obs: &Tensor) -> Result<Tensor> {
        Ok(self.vf.forward(obs)?.squeeze(D::Minus1)?)
    }

    /// Takes an action for a single observation.
    ///
    /// Returns the action, the value estimate and the log-probability of the action.
    pub fn step(&mut self, obs: &[f32], deterministic: bool) -> Result<(Vec<f32>, f32, f32)> {
        let obs = self.obs_tensor(obs)?;
        let dist = self.dist(&obs)?;
        let (act, logp) = if deterministic {
            let act = dist.mode()?;
            let logp = dist.log_prob(&act)?;
            (act, logp)
        } else {
            dist.actions_and_log_prob(&mut self.rng)?
        };
        let value = self.value_tensor(&obs)?;

        Ok((
            act.detach().flatten_all()?.to_vec1::<f32>()?,
            value.detach().to_vec1::<f32>()?[0],
            logp.detach().to_vec1::<f32>()?[0],
        ))
    }

    /// Value estimate of a single observation.
    pub fn value(&self, obs: &[f32]) -> Result<f32> {
        let obs = self.obs_tensor(obs)?;
        Ok(self.value_tensor(&obs)?.detach().to_vec1::<f32>()?[0])
    }

    /// Applies an update step to the policy parameters.
    pub fn pi_backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.pi_opt.backward_step(loss)
    }

    /// Applies an update step to the value function parameters.
    pub fn vf_backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.vf_opt.backward_step(loss)
    }

    /// Saves the parameters of both networks in a safetensors file.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save actor-critic to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the parameters of both networks from a safetensors file.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load actor-critic from {:?}", path.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    fn config(distribution: DistributionKind) -> ActorCriticConfig {
        ActorCriticConfig::default()
            .obs_dim(3)
            .act_dim(2)
            .hidden_sizes(vec![16, 16])
            .distribution(distribution)
    }

    #[test]
    fn test_parameter_groups() -> Result<()> {
        let ac = ActorCritic::build(config(DistributionKind::default()))?;
        let pi = vars_with_prefix(&ac.varmap, "pi.")?;
        let vf = vars_with_prefix(&ac.varmap, "vf.")?;

        // 3 layers with weight and bias, plus log_std
        assert_eq!(pi.len(), 7);
        assert_eq!(vf.len(), 6);
        assert_eq!(ac.varmap.all_vars().len(), 13);
        Ok(())
    }

    #[test]
    fn test_same_seed_same_behavior() -> Result<()> {
        let obs = [0.1f32, -0.2, 0.3];
        let mut ac1 = ActorCritic::build(config(DistributionKind::Beta))?;
        let mut ac2 = ActorCritic::build(config(DistributionKind::Beta))?;

        for _ in 0..5 {
            let (a1, v1, l1) = ac1.step(&obs, false)?;
            let (a2, v2, l2) = ac2.step(&obs, false)?;
            assert_eq!(a1, a2);
            assert_eq!(v1, v2);
            assert_eq!(l1, l2);
        }
        Ok(())
    }

    #[test]
    fn test_deterministic_step() -> Result<()> {
        let obs = [0.5f32, 0.5, -1.0];
        let mut ac = ActorCritic::build(config(DistributionKind::squashed_diag_gaussian()))?;
        let (a1, _, l1) = ac.step(&obs, true)?;
        let (a2, _, l2) = ac.step(&obs, true)?;

        assert_eq!(a1, a2);
        assert_eq!(l1, l2);
        assert_eq!(a1.len(), 2);
        Ok(())
    }

    #[test]
    fn test_obs_shape_mismatch() -> Result<()> {
        let mut ac = ActorCritic::build(config(DistributionKind::default()))?;
        assert!(ac.step(&[0.0, 1.0], false).is_err());
        assert!(ActorCritic::build(config(DistributionKind::default()).obs_dim(0)).is_err());
        Ok(())
    }

    #[test]
    fn test_save_load() -> Result<()> {
        let tmp = TempDir::new("actor_critic")?;
        let path = tmp.path().join("ac.safetensors");
        let obs = [0.3f32, 0.2, 0.1];
        let ac1 = ActorCritic::build(config(DistributionKind::BetaMeanConcentration))?;
        ac1.save(&path)?;

        let mut ac2 = ActorCritic::build(
            config(DistributionKind::BetaMeanConcentration).seed(7),
        )?;
        assert_ne!(ac1.value(&obs)?, ac2.value(&obs)?);
        ac2.load(&path)?;
        assert_eq!(ac1.value(&obs)?, ac2.value(&obs)?);
        Ok(())
    }
}
