//! Log-gamma and digamma functions for positive arguments.
//!
//! Both shift the argument by the recurrence `Γ(z+1) = zΓ(z)` until it is
//! at least 6 and then evaluate an asymptotic series.
use anyhow::Result;
use candle_core::Tensor;

const SHIFT: usize = 6;
const HALF_LN_2PI: f64 = 0.918_938_533_204_672_8;

/// `ln Γ(z)` for `z > 0`.
pub fn ln_gamma(z: &Tensor) -> Result<Tensor> {
    let mut acc = z.log()?;
    for k in 1..SHIFT {
        acc = (acc + (z + k as f64)?.log()?)?;
    }
    let w = (z + SHIFT as f64)?;
    let r = w.recip()?;
    let r2 = r.sqr()?;

    // 1/(12w) - 1/(360w^3) + 1/(1260w^5)
    let series = (r2.affine(1.0 / 1260.0, -1.0 / 360.0)? * &r2)?;
    let series = ((series + 1.0 / 12.0)? * &r)?;
    let stirling = ((w.affine(1.0, -0.5)? * w.log()?)? - &w)?;
    let stirling = ((stirling + HALF_LN_2PI)? + series)?;

    Ok((stirling - acc)?)
}

/// Digamma function `ψ(z) = d/dz ln Γ(z)` for `z > 0`.
pub fn digamma(z: &Tensor) -> Result<Tensor> {
    let mut acc = z.recip()?;
    for k in 1..SHIFT {
        acc = (acc + (z + k as f64)?.recip()?)?;
    }
    let w = (z + SHIFT as f64)?;
    let r = w.recip()?;
    let r2 = r.sqr()?;

    // 1/(12w^2) - 1/(120w^4) + 1/(252w^6)
    let series = (r2.affine(1.0 / 252.0, -1.0 / 120.0)? * &r2)?;
    let series = ((series + 1.0 / 12.0)? * &r2)?;
    let asym = ((w.log()? - r.affine(0.5, 0.0)?)? - series)?;

    Ok((asym - acc)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::Device;

    const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

    fn ln_gamma_f64(z: f64) -> f64 {
        let acc: f64 = (0..SHIFT).map(|k| (z + k as f64).ln()).sum();
        let w = z + SHIFT as f64;
        let r = w.recip();
        let r2 = r * r;
        let series = r * (1.0 / 12.0 - r2 * (1.0 / 360.0 - r2 / 1260.0));
        (w - 0.5) * w.ln() - w + HALF_LN_2PI + series - acc
    }

    fn digamma_f64(z: f64) -> f64 {
        let acc: f64 = (0..SHIFT).map(|k| (z + k as f64).recip()).sum();
        let w = z + SHIFT as f64;
        let r = w.recip();
        let r2 = r * r;
        let series = r2 * (1.0 / 12.0 - r2 * (1.0 / 120.0 - r2 / 252.0));
        w.ln() - 0.5 * r - series - acc
    }

    #[test]
    fn test_scalar_known_values() {
        assert!(ln_gamma_f64(1.0).abs() < 1e-8);
        assert!(ln_gamma_f64(2.0).abs() < 1e-8);
        assert!((ln_gamma_f64(0.5) - 0.5 * std::f64::consts::PI.ln()).abs() < 1e-8);
        assert!((ln_gamma_f64(10.0) - 362880f64.ln()).abs() < 1e-8);

        assert!((digamma_f64(1.0) + EULER_GAMMA).abs() < 1e-8);
        assert!((digamma_f64(0.5) + EULER_GAMMA + 2.0 * 2f64.ln()).abs() < 1e-8);
        // ψ(z + 1) = ψ(z) + 1/z
        assert!((digamma_f64(3.7) - digamma_f64(2.7) - 1.0 / 2.7).abs() < 1e-8);
    }

    #[test]
    fn test_tensor_matches_scalar() -> Result<()> {
        let zs = [0.1f32, 0.5, 1.0, 1.5, 3.0, 12.0, 80.0];
        let t = Tensor::from_slice(&zs, (zs.len(),), &Device::Cpu)?;
        let lg = ln_gamma(&t)?.to_vec1::<f32>()?;
        let dg = digamma(&t)?.to_vec1::<f32>()?;

        for (i, z) in zs.iter().enumerate() {
            let z = *z as f64;
            let tol = 1e-4 * (1.0 + ln_gamma_f64(z).abs());
            assert!((lg[i] as f64 - ln_gamma_f64(z)).abs() < tol, "ln_gamma({})", z);
            let tol = 1e-4 * (1.0 + digamma_f64(z).abs());
            assert!((dg[i] as f64 - digamma_f64(z)).abs() < tol, "digamma({})", z);
        }
        Ok(())
    }
}
