use super::{Beta, DiagGaussian, DistributionKind, RawParams, SquashedDiagGaussian};
use anyhow::{bail, Result};
use candle_core::Tensor;
use rand::Rng;

/// Lower bound of the variance in the mean/std Beta parameterization.
const MIN_VAR: f64 = 1e-8;

/// Action distribution bound to the parameters for a batch of observations.
#[derive(Clone, Debug)]
pub enum ActionDistribution {
    /// Diagonal Gaussian.
    DiagGaussian(DiagGaussian),

    /// Diagonal Gaussian squashed by `tanh`.
    SquashedDiagGaussian(SquashedDiagGaussian),

    /// Beta with shapes larger than 1.
    Beta(Beta),
}

impl ActionDistribution {
    /// Binds the raw output of the policy head to a distribution of the given kind.
    ///
    /// Beta shapes are shifted by 1 in every parameterization.
    pub fn bind(kind: &DistributionKind, raw: RawParams) -> Result<Self> {
        Ok(match (kind, raw) {
            (DistributionKind::DiagGaussian { .. }, RawParams::Gaussian { mean, log_std }) => {
                Self::DiagGaussian(DiagGaussian::new(mean, &log_std)?)
            }
            (
                DistributionKind::SquashedDiagGaussian { epsilon, .. },
                RawParams::Gaussian { mean, log_std },
            ) => Self::SquashedDiagGaussian(SquashedDiagGaussian::new(
                DiagGaussian::new(mean, &log_std)?,
                *epsilon,
            )),
            (DistributionKind::Beta, RawParams::Beta { alpha, beta }) => {
                Self::Beta(Beta::from_shifted(&alpha, &beta)?)
            }
            (DistributionKind::BetaMeanConcentration, RawParams::MeanConcentration { u, k }) => {
                let k1 = (k - 1.0)?;
                let alpha = (&u * &k1)?;
                let beta = (u.affine(-1.0, 1.0)? * k1)?;
                Self::Beta(Beta::from_shifted(&alpha, &beta)?)
            }
            (DistributionKind::BetaMeanStd { std_scale }, RawParams::MeanStd { u, s }) => {
                let var = (s.affine(*std_scale, 0.0)?.sqr()? + MIN_VAR)?;
                let u1 = u.affine(-1.0, 1.0)?;
                let c = ((&u * &u1)? / var)?.affine(1.0, -1.0)?.relu()?;
                let alpha = (&u * &c)?;
                let beta = (u1 * c)?;
                Self::Beta(Beta::from_shifted(&alpha, &beta)?)
            }
            (kind, _) => bail!("Raw parameters do not match the distribution {:?}", kind),
        })
    }

    /// Draws actions, `(batch_size, act_dim)`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Tensor> {
        match self {
            Self::DiagGaussian(d) => d.sample(rng),
            Self::SquashedDiagGaussian(d) => d.sample(rng),
            Self::Beta(d) => d.sample(rng),
        }
    }

    /// Deterministic actions.
    pub fn mode(&self) -> Result<Tensor> {
        match self {
            Self::DiagGaussian(d) => d.mode(),
            Self::SquashedDiagGaussian(d) => d.mode(),
            Self::Beta(d) => d.mode(),
        }
    }

    /// Log-probability of actions, `(batch_size,)`.
    pub fn log_prob(&self, act: &Tensor) -> Result<Tensor> {
        match self {
            Self::DiagGaussian(d) => d.log_prob(act),
            Self::SquashedDiagGaussian(d) => d.log_prob(act),
            Self::Beta(d) => d.log_prob(act),
        }
    }

    /// Entropy, `(batch_size,)`, or `None` without a closed form.
    pub fn entropy(&self) -> Result<Option<Tensor>> {
        match self {
            Self::DiagGaussian(d) => Ok(Some(d.entropy()?)),
            Self::SquashedDiagGaussian(_) => Ok(None),
            Self::Beta(d) => Ok(Some(d.entropy()?)),
        }
    }

    /// Draws actions and evaluates their log-probability.
    pub fn actions_and_log_prob<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(Tensor, Tensor)> {
        match self {
            Self::DiagGaussian(d) => {
                let act = d.sample(rng)?;
                let lp = d.log_prob(&act)?;
                Ok((act, lp))
            }
            Self::SquashedDiagGaussian(d) => d.actions_and_log_prob(rng),
            Self::Beta(d) => d.actions_and_log_prob(rng),
        }
    }
}
