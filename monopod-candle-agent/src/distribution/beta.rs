use super::special::{digamma, ln_gamma};
use crate::util::sum_independent_dims;
use anyhow::{anyhow, Result};
use candle_core::Tensor;
use rand::Rng;
use rand_distr::{Beta as BetaSampler, Distribution as _};

/// Clipping bound of the unit-interval value in [`Beta::log_prob`].
const UNIT_EPS: f64 = 1e-6;

/// Beta distribution on `[0, 1]`, mapped affinely to actions in `[-1, 1]`.
///
/// The shape parameters are expected to be larger than 1, which makes the
/// density unimodal and zero at the bounds.
#[derive(Clone, Debug)]
pub struct Beta {
    pub(super) alpha: Tensor,
    pub(super) beta: Tensor,
}

impl Beta {
    /// Creates the distribution from shape parameters.
    pub fn new(alpha: Tensor, beta: Tensor) -> Self {
        Self { alpha, beta }
    }

    /// Creates the distribution from non-negative `alpha` and `beta`, each shifted by 1.
    pub fn from_shifted(alpha: &Tensor, beta: &Tensor) -> Result<Self> {
        Ok(Self::new((alpha + 1.0)?, (beta + 1.0)?))
    }

    /// Shape parameters.
    pub fn shapes(&self) -> (&Tensor, &Tensor) {
        (&self.alpha, &self.beta)
    }

    /// `ln B(alpha, beta)`.
    fn ln_beta_fn(&self) -> Result<Tensor> {
        let ab = (&self.alpha + &self.beta)?;
        Ok(((ln_gamma(&self.alpha)? + ln_gamma(&self.beta)?)? - ln_gamma(&ab)?)?)
    }

    /// Draws a sample on the host and maps it with `2x - 1`.
    ///
    /// Unlike [`DiagGaussian::sample`](super::DiagGaussian::sample), the sample
    /// is not reparameterized: no gradient flows from it to the shape
    /// parameters. Actions stored for PPO are detached, so only
    /// [`Beta::log_prob`] needs gradients.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Tensor> {
        let alpha = self.alpha.flatten_all()?.to_vec1::<f32>()?;
        let beta = self.beta.flatten_all()?.to_vec1::<f32>()?;
        let xs = alpha
            .iter()
            .zip(beta.iter())
            .map(|(a, b)| {
                let d = BetaSampler::new(*a, *b)
                    .map_err(|e| anyhow!("Invalid Beta parameters ({}, {}): {}", a, b, e))?;
                Ok(2.0 * d.sample(rng) - 1.0)
            })
            .collect::<Result<Vec<f32>>>()?;
        Ok(Tensor::from_vec(xs, self.alpha.shape(), self.alpha.device())?)
    }

    /// `2 * alpha / (alpha + beta) - 1`, the mean mapped to `[-1, 1]`.
    pub fn mode(&self) -> Result<Tensor> {
        let ab = (&self.alpha + &self.beta)?;
        Ok((&self.alpha / ab)?.affine(2.0, -1.0)?)
    }

    /// Log-density summed over the action dimensions.
    ///
    /// The density is that of `x = (a + 1) / 2` on the unit interval, with `x`
    /// clipped away from 0 and 1.
    pub fn log_prob(&self, act: &Tensor) -> Result<Tensor> {
        let x = act.affine(0.5, 0.5)?.clamp(UNIT_EPS, 1.0 - UNIT_EPS)?;
        let t1 = ((&self.alpha - 1.0)? * x.log()?)?;
        let t2 = ((&self.beta - 1.0)? * x.affine(-1.0, 1.0)?.log()?)?;
        let lp = ((t1 + t2)? - self.ln_beta_fn()?)?;
        sum_independent_dims(&lp)
    }

    /// `ln B - (α-1)ψ(α) - (β-1)ψ(β) + (α+β-2)ψ(α+β)`, summed over the action dimensions.
    pub fn entropy(&self) -> Result<Tensor> {
        let ab = (&self.alpha + &self.beta)?;
        let ta = ((&self.alpha - 1.0)? * digamma(&self.alpha)?)?;
        let tb = ((&self.beta - 1.0)? * digamma(&self.beta)?)?;
        let tab = ((&ab - 2.0)? * digamma(&ab)?)?;
        let ent = (((self.ln_beta_fn()? - ta)? - tb)? + tab)?;
        sum_independent_dims(&ent)
    }

    /// Draws actions and evaluates their log-density.
    pub fn actions_and_log_prob<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(Tensor, Tensor)> {
        let act = self.sample(rng)?;
        let lp = self.log_prob(&act)?;
        Ok((act, lp))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::{Device, Var};
    use rand::{rngs::StdRng, SeedableRng};

    fn tensor(xs: &[f32]) -> Result<Tensor> {
        Ok(Tensor::from_slice(xs, (1, xs.len()), &Device::Cpu)?)
    }

    #[test]
    fn test_uniform() -> Result<()> {
        // Beta(1, 1) is uniform on [0, 1]
        let d = Beta::new(tensor(&[1.0])?, tensor(&[1.0])?);
        let lp = d.log_prob(&tensor(&[0.3])?)?.to_vec1::<f32>()?;
        let ent = d.entropy()?.to_vec1::<f32>()?;

        assert!(lp[0].abs() < 1e-4);
        assert!(ent[0].abs() < 1e-4);
        Ok(())
    }

    #[test]
    fn test_known_density_and_entropy() -> Result<()> {
        // Beta(2, 3): pdf(x) = 12 x (1 - x)^2
        let d = Beta::new(tensor(&[2.0])?, tensor(&[3.0])?);
        let x = 0.25f64;
        let act = tensor(&[(2.0 * x - 1.0) as f32])?;
        let lp = d.log_prob(&act)?.to_vec1::<f32>()?[0] as f64;
        let expected = (12.0 * x * (1.0 - x).powi(2)).ln();
        assert!((lp - expected).abs() < 1e-4);

        // H = ln B(2,3) - ψ(2) - 2ψ(3) + 3ψ(5) = -0.2349066...
        let ent = d.entropy()?.to_vec1::<f32>()?[0] as f64;
        assert!((ent + 0.234_906_6).abs() < 1e-4);
        Ok(())
    }

    #[test]
    fn test_samples_in_bounds_and_mode() -> Result<()> {
        let d = Beta::from_shifted(&tensor(&[0.0, 4.0])?, &tensor(&[2.0, 0.5])?)?;
        let mut rng = StdRng::seed_from_u64(42);

        let (a, b) = d.shapes();
        assert_eq!(a.flatten_all()?.to_vec1::<f32>()?, vec![1.0, 5.0]);
        assert_eq!(b.flatten_all()?.to_vec1::<f32>()?, vec![3.0, 1.5]);

        let mode = d.mode()?.flatten_all()?.to_vec1::<f32>()?;
        assert!((mode[0] - (2.0 * 0.25 - 1.0)).abs() < 1e-6);

        for _ in 0..50 {
            let (act, lp) = d.actions_and_log_prob(&mut rng)?;
            for a in act.flatten_all()?.to_vec1::<f32>()? {
                assert!((-1.0..=1.0).contains(&a));
            }
            assert!(lp.to_vec1::<f32>()?[0].is_finite());
        }
        Ok(())
    }

    #[test]
    fn test_gradient_through_log_prob_only() -> Result<()> {
        let alpha = Var::from_tensor(&tensor(&[2.0, 3.0])?)?;
        let d = Beta::new(alpha.as_tensor().clone(), tensor(&[4.0, 1.5])?);
        let mut rng = StdRng::seed_from_u64(0);

        let act = d.sample(&mut rng)?;
        let grads = act.sum_all()?.backward()?;
        assert!(grads.get(alpha.as_tensor()).is_none());

        let grads = d.log_prob(&act)?.sum_all()?.backward()?;
        assert!(grads.get(alpha.as_tensor()).is_some());
        Ok(())
    }
}
