use crate::util::sum_independent_dims;
use anyhow::Result;
use candle_core::Tensor;
use rand::Rng;
use rand_distr::StandardNormal;

const HALF_LN_2PI: f64 = 0.918_938_533_204_672_8;

/// Gaussian distribution with diagonal covariance.
///
/// `std` is broadcast to the shape of `mean`, `(batch_size, act_dim)`.
#[derive(Clone, Debug)]
pub struct DiagGaussian {
    pub(super) mean: Tensor,
    pub(super) std: Tensor,
}

impl DiagGaussian {
    /// Creates the distribution from the mean and a state-independent log standard deviation.
    pub fn new(mean: Tensor, log_std: &Tensor) -> Result<Self> {
        let std = log_std.exp()?.broadcast_as(mean.shape())?.contiguous()?;
        Ok(Self { mean, std })
    }

    /// `mean + std * eps` with `eps ~ N(0, I)` drawn from `rng`.
    ///
    /// The sample is differentiable with respect to `mean` and `std`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Tensor> {
        let eps: Vec<f32> = (0..self.mean.elem_count())
            .map(|_| rng.sample(StandardNormal))
            .collect();
        let eps = Tensor::from_vec(eps, self.mean.shape(), self.mean.device())?;
        Ok((&self.mean + (&self.std * eps)?)?)
    }

    /// The mean.
    pub fn mode(&self) -> Result<Tensor> {
        Ok(self.mean.clone())
    }

    /// Log-density summed over the action dimensions.
    pub fn log_prob(&self, act: &Tensor) -> Result<Tensor> {
        let z = ((act - &self.mean)? / &self.std)?;
        let lp = (z.sqr()?.affine(-0.5, -HALF_LN_2PI)? - self.std.log()?)?;
        sum_independent_dims(&lp)
    }

    /// `0.5 + 0.5 ln(2π) + ln(std)`, summed over the action dimensions.
    pub fn entropy(&self) -> Result<Tensor> {
        let ent = (self.std.log()? + (0.5 + HALF_LN_2PI))?;
        sum_independent_dims(&ent)
    }
}
