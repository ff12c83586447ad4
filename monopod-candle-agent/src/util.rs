//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{Tensor, D};
use candle_nn::VarMap;
use log::trace;
use rand::Rng;

/// `ln(1 + exp(x))`, computed as `max(x, 0) + ln(1 + exp(-|x|))`.
pub fn softplus(x: &Tensor) -> Result<Tensor> {
    let tail = (x.abs()?.neg()?.exp()? + 1.0)?.log()?;
    Ok((x.relu()? + tail)?)
}

/// Inverse hyperbolic tangent, `0.5 * ln((1 + x) / (1 - x))`.
pub fn atanh(x: &Tensor) -> Result<Tensor> {
    let num = x.affine(1.0, 1.0)?;
    let den = x.affine(-1.0, 1.0)?;
    Ok((num / den)?.log()?.affine(0.5, 0.0)?)
}

/// Sums over the last dimension, the independent action dimensions.
pub fn sum_independent_dims(x: &Tensor) -> Result<Tensor> {
    Ok(x.sum(D::Minus1)?)
}

/// Reinitializes parameters with `U(-1/sqrt(fan_in), 1/sqrt(fan_in))` drawn from `rng`.
///
/// Weights `*.weight` are `(out_dim, in_dim)` and the bias `*.bias` of the same
/// layer shares its bound. Variables with other names, like `log_std`, are left as is.
/// Variables are visited in the order of their names, so the result only depends on
/// the state of `rng`.
pub fn init_params<R: Rng + ?Sized>(varmap: &VarMap, rng: &mut R) -> Result<()> {
    let data = varmap
        .data()
        .lock()
        .map_err(|e| anyhow!("Failed to lock varmap: {}", e))?;
    let mut names: Vec<&String> = data.keys().collect();
    names.sort();

    for name in names {
        let fan_in = if name.ends_with(".weight") {
            data[name].dims().last().copied()
        } else if let Some(prefix) = name.strip_suffix(".bias") {
            data.get(&format!("{}.weight", prefix))
                .and_then(|w| w.dims().last().copied())
        } else {
            None
        };

        if let Some(fan_in) = fan_in {
            let var = &data[name];
            let bound = 1.0 / (fan_in as f32).sqrt();
            let values: Vec<f32> = (0..var.elem_count())
                .map(|_| rng.gen_range(-bound..bound))
                .collect();
            let t = Tensor::from_vec(values, var.shape(), var.device())?.to_dtype(var.dtype())?;
            var.set(&t)?;
            trace!("Initialized {} with bound {}", name, bound);
        }
    }

    Ok(())
}
