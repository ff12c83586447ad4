use super::DiagGaussian;
use crate::util::{atanh, sum_independent_dims};
use anyhow::Result;
use candle_core::Tensor;
use rand::Rng;

/// Bound of the squashed actions, keeping `atanh` finite.
const ACT_BOUND: f64 = 1.0 - f32::EPSILON as f64;

/// Diagonal Gaussian followed by `tanh`, bounding actions to `(-1, 1)`.
#[derive(Clone, Debug)]
pub struct SquashedDiagGaussian {
    pub(super) gaussian: DiagGaussian,
    pub(super) epsilon: f64,
}

impl SquashedDiagGaussian {
    /// Creates the distribution.
    ///
    /// `epsilon` is added inside the log of the change-of-variables correction.
    pub fn new(gaussian: DiagGaussian, epsilon: f64) -> Self {
        Self { gaussian, epsilon }
    }

    fn squash(x: &Tensor) -> Result<Tensor> {
        Ok(x.tanh()?.clamp(-ACT_BOUND, ACT_BOUND)?)
    }

    /// `Σ ln(1 - a^2 + epsilon)`.
    fn log_det_jacobian(&self, act: &Tensor) -> Result<Tensor> {
        let t = act.sqr()?.affine(-1.0, 1.0 + self.epsilon)?.log()?;
        sum_independent_dims(&t)
    }

    /// Draws a squashed sample.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Tensor> {
        Self::squash(&self.gaussian.sample(rng)?)
    }

    /// `tanh` of the Gaussian mean.
    pub fn mode(&self) -> Result<Tensor> {
        Self::squash(&self.gaussian.mode()?)
    }

    /// Log-density of squashed actions.
    ///
    /// Actions are clipped into the open interval before inverting `tanh`.
    pub fn log_prob(&self, act: &Tensor) -> Result<Tensor> {
        let act = act.clamp(-ACT_BOUND, ACT_BOUND)?;
        let pre = atanh(&act)?;
        Ok((self.gaussian.log_prob(&pre)? - self.log_det_jacobian(&act)?)?)
    }

    /// Draws actions and evaluates their log-density with the pre-squash sample.
    pub fn actions_and_log_prob<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(Tensor, Tensor)> {
        let pre = self.gaussian.sample(rng)?;
        let act = Self::squash(&pre)?;
        let lp = (self.gaussian.log_prob(&pre)? - self.log_det_jacobian(&act)?)?;
        Ok((act, lp))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::Device;
    use rand::{rngs::StdRng, SeedableRng};

    fn dist(mean: &[f32], log_std: &[f32]) -> Result<SquashedDiagGaussian> {
        let mean = Tensor::from_slice(mean, (mean.len() / 2, 2), &Device::Cpu)?;
        let log_std = Tensor::from_slice(log_std, (2,), &Device::Cpu)?;
        Ok(SquashedDiagGaussian::new(DiagGaussian::new(mean, &log_std)?, 1e-6))
    }

    #[test]
    fn test_actions_strictly_bounded() -> Result<()> {
        let d = dist(&[0.0, 30.0, -40.0, 1.0], &[0.5, 1.0])?;
        let mut rng = StdRng::seed_from_u64(42);

        for a in d.mode()?.flatten_all()?.to_vec1::<f32>()? {
            assert!(a > -1.0 && a < 1.0);
        }
        for _ in 0..50 {
            let (act, lp) = d.actions_and_log_prob(&mut rng)?;
            for a in act.flatten_all()?.to_vec1::<f32>()? {
                assert!(a > -1.0 && a < 1.0);
            }
            for l in lp.to_vec1::<f32>()? {
                assert!(l.is_finite());
            }
        }
        Ok(())
    }

    #[test]
    fn test_log_prob_consistent_with_sampling() -> Result<()> {
        let d = dist(&[0.2, -0.3], &[-1.0, -1.0])?;
        let mut rng = StdRng::seed_from_u64(7);
        let (act, lp) = d.actions_and_log_prob(&mut rng)?;
        let lp_inv = d.log_prob(&act)?;

        let diff = (lp - lp_inv)?.abs()?.to_vec1::<f32>()?;
        assert!(diff[0] < 1e-3);
        Ok(())
    }

    #[test]
    fn test_log_prob_at_bounds_is_finite() -> Result<()> {
        let d = dist(&[0.0, 0.0], &[0.5, 1.0])?;
        let act = Tensor::from_slice(&[1.0f32, -1.0], (1, 2), &Device::Cpu)?;
        assert!(d.log_prob(&act)?.to_vec1::<f32>()?[0].is_finite());
        Ok(())
    }
}
