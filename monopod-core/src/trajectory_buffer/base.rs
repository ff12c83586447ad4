//! Fixed-capacity trajectory buffer.
use super::{EpochBatch, TrajectoryBufferConfig};
use crate::error::MonopodError;
use anyhow::Result;
use log::trace;

/// Discounted cumulative sum, `y[i] = x[i] + discount * y[i + 1]`.
///
/// ```rust
/// use monopod_core::discount_cumsum;
///
/// assert_eq!(discount_cumsum(&[1.0, 1.0, 1.0], 0.5), vec![1.75, 1.5, 1.0]);
/// ```
pub fn discount_cumsum(x: &[f32], discount: f32) -> Vec<f32> {
    let mut y = vec![0f32; x.len()];
    let mut acc = 0f32;
    for (i, v) in x.iter().enumerate().rev() {
        acc = v + discount * acc;
        y[i] = acc;
    }
    y
}

/// A buffer storing the transitions of one epoch.
///
/// Transitions are written at a monotonically increasing index `ptr`.
/// [`TrajectoryBuffer::finish_path`] closes the segment `path_start..ptr`,
/// computing GAE-Lambda advantages and rewards-to-go for it.
/// [`TrajectoryBuffer::get`] is valid only when the buffer is full and
/// resets both indices, so that the storage is overwritten in the next epoch.
pub struct TrajectoryBuffer {
    capacity: usize,
    obs_dim: usize,
    act_dim: usize,
    gamma: f32,
    lambda: f32,
    normalize_advantages: bool,
    obs: Vec<f32>,
    act: Vec<f32>,
    adv: Vec<f32>,
    rew: Vec<f32>,
    ret: Vec<f32>,
    val: Vec<f32>,
    logp: Vec<f32>,
    ptr: usize,
    path_start: usize,
}

impl TrajectoryBuffer {
    /// Builds a buffer.
    pub fn build(config: &TrajectoryBufferConfig) -> Result<Self> {
        if config.capacity == 0 {
            return Err(MonopodError::InvalidConfig("capacity must be positive".into()).into());
        }
        if config.obs_dim == 0 || config.act_dim == 0 {
            return Err(MonopodError::InvalidConfig(
                "obs_dim and act_dim must be positive".into(),
            )
            .into());
        }
        if !(0.0..=1.0).contains(&config.gamma) || !(0.0..=1.0).contains(&config.lambda) {
            return Err(
                MonopodError::InvalidConfig("gamma and lambda must be in [0, 1]".into()).into(),
            );
        }

        let capacity = config.capacity;
        Ok(Self {
            capacity,
            obs_dim: config.obs_dim,
            act_dim: config.act_dim,
            gamma: config.gamma,
            lambda: config.lambda,
            normalize_advantages: config.normalize_advantages,
            obs: vec![0f32; capacity * config.obs_dim],
            act: vec![0f32; capacity * config.act_dim],
            adv: vec![0f32; capacity],
            rew: vec![0f32; capacity],
            ret: vec![0f32; capacity],
            val: vec![0f32; capacity],
            logp: vec![0f32; capacity],
            ptr: 0,
            path_start: 0,
        })
    }

    /// Appends a transition.
    pub fn store(&mut self, obs: &[f32], act: &[f32], rew: f32, val: f32, logp: f32) -> Result<()> {
        if self.ptr >= self.capacity {
            return Err(MonopodError::BufferOverflow {
                capacity: self.capacity,
            }
            .into());
        }
        if obs.len() != self.obs_dim {
            return Err(MonopodError::ShapeMismatch {
                name: "observation".into(),
                expected: self.obs_dim,
                actual: obs.len(),
            }
            .into());
        }
        if act.len() != self.act_dim {
            return Err(MonopodError::ShapeMismatch {
                name: "action".into(),
                expected: self.act_dim,
                actual: act.len(),
            }
            .into());
        }

        let i = self.ptr;
        self.obs[i * self.obs_dim..(i + 1) * self.obs_dim].copy_from_slice(obs);
        self.act[i * self.act_dim..(i + 1) * self.act_dim].copy_from_slice(act);
        self.rew[i] = rew;
        self.val[i] = val;
        self.logp[i] = logp;
        self.ptr += 1;

        Ok(())
    }

    /// Closes the current trajectory segment.
    ///
    /// `last_val` is `0` if the episode terminated, otherwise the value estimate
    /// of the last observation, bootstrapping the rewards beyond the cut.
    pub fn finish_path(&mut self, last_val: f32) {
        let (s, e) = (self.path_start, self.ptr);
        if s == e {
            return;
        }

        let rews: Vec<f32> = self.rew[s..e].iter().copied().chain([last_val]).collect();
        let vals: Vec<f32> = self.val[s..e].iter().copied().chain([last_val]).collect();

        let deltas: Vec<f32> = (0..e - s)
            .map(|t| rews[t] + self.gamma * vals[t + 1] - vals[t])
            .collect();
        let adv = discount_cumsum(&deltas, self.gamma * self.lambda);
        let ret = discount_cumsum(&rews, self.gamma);

        self.adv[s..e].copy_from_slice(&adv);
        self.ret[s..e].copy_from_slice(&ret[..e - s]);
        trace!("Finished path {}..{} with last_val = {}", s, e, last_val);

        self.path_start = e;
    }

    /// Takes all transitions of the epoch and resets the buffer.
    pub fn get(&mut self) -> Result<EpochBatch> {
        if self.ptr != self.capacity {
            return Err(MonopodError::BufferNotFull {
                len: self.ptr,
                capacity: self.capacity,
            }
            .into());
        }
        self.ptr = 0;
        self.path_start = 0;

        let adv = match self.normalize_advantages {
            true => normalize(&self.adv),
            false => self.adv.clone(),
        };

        Ok(EpochBatch {
            obs: self.obs.clone(),
            act: self.act.clone(),
            ret: self.ret.clone(),
            adv,
            logp: self.logp.clone(),
            obs_dim: self.obs_dim,
            act_dim: self.act_dim,
        })
    }

    /// The number of stored transitions.
    pub fn len(&self) -> usize {
        self.ptr
    }

    /// Returns `true` if no transition is stored.
    pub fn is_empty(&self) -> bool {
        self.ptr == 0
    }

    /// Returns `true` if the buffer is full.
    pub fn is_full(&self) -> bool {
        self.ptr == self.capacity
    }

    /// Capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Start index of the current trajectory segment.
    pub fn path_start(&self) -> usize {
        self.path_start
    }
}

fn normalize(x: &[f32]) -> Vec<f32> {
    let n = x.len() as f32;
    let mean = x.iter().sum::<f32>() / n;
    let std = (x.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n).sqrt();
    x.iter().map(|v| (v - mean) / (std + 1e-8)).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn config(capacity: usize, gamma: f32, lambda: f32) -> TrajectoryBufferConfig {
        TrajectoryBufferConfig::default()
            .capacity(capacity)
            .obs_dim(2)
            .act_dim(1)
            .gamma(gamma)
            .lambda(lambda)
    }

    fn assert_close(xs: &[f32], ys: &[f32]) {
        assert_eq!(xs.len(), ys.len());
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert!((x - y).abs() < 1e-5, "{:?} != {:?}", xs, ys);
        }
    }

    #[test]
    fn test_discount_cumsum() {
        assert_eq!(discount_cumsum(&[1.0, 1.0, 1.0], 0.5), vec![1.75, 1.5, 1.0]);
        assert_eq!(discount_cumsum(&[2.0], 0.9), vec![2.0]);
        assert!(discount_cumsum(&[], 0.9).is_empty());
    }

    #[test]
    fn test_single_step_gae() -> Result<()> {
        let mut buffer = TrajectoryBuffer::build(&config(1, 1.0, 1.0))?;
        buffer.store(&[0.0, 0.0], &[0.0], 1.0, 0.0, 0.0)?;
        buffer.finish_path(0.0);
        let batch = buffer.get()?;

        assert_close(&batch.adv, &[1.0]);
        assert_close(&batch.ret, &[1.0]);
        Ok(())
    }

    #[test]
    fn test_gae_with_bootstrap() -> Result<()> {
        let mut buffer = TrajectoryBuffer::build(&config(2, 1.0, 0.5))?;
        buffer.store(&[0.0, 0.0], &[0.0], 1.0, 1.0, 0.0)?;
        buffer.store(&[0.0, 0.0], &[0.0], 1.0, 2.0, 0.0)?;
        buffer.finish_path(3.0);
        let batch = buffer.get()?;

        // deltas = [1 + 2 - 1, 1 + 3 - 2] = [2, 2]
        assert_close(&batch.adv, &[3.0, 2.0]);
        assert_close(&batch.ret, &[5.0, 4.0]);
        Ok(())
    }

    #[test]
    fn test_segments_are_independent() -> Result<()> {
        let mut buffer = TrajectoryBuffer::build(&config(4, 0.5, 1.0))?;
        for _ in 0..2 {
            buffer.store(&[0.0, 0.0], &[0.0], 1.0, 0.0, 0.0)?;
            buffer.store(&[0.0, 0.0], &[0.0], 1.0, 0.0, 0.0)?;
            buffer.finish_path(0.0);
            assert_eq!(buffer.path_start(), buffer.len());
        }
        let batch = buffer.get()?;

        assert_close(&batch.ret, &[1.5, 1.0, 1.5, 1.0]);
        assert_close(&batch.adv, &[1.5, 1.0, 1.5, 1.0]);
        Ok(())
    }

    #[test]
    fn test_capacity() -> Result<()> {
        let mut buffer = TrajectoryBuffer::build(&config(3, 0.99, 0.97))?;
        for _ in 0..3 {
            buffer.store(&[0.0, 0.0], &[0.0], 1.0, 0.0, 0.0)?;
        }
        assert!(buffer.is_full());

        let err = buffer
            .store(&[0.0, 0.0], &[0.0], 1.0, 0.0, 0.0)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MonopodError>(),
            Some(MonopodError::BufferOverflow { capacity: 3 })
        ));
        Ok(())
    }

    #[test]
    fn test_get_before_full() -> Result<()> {
        let mut buffer = TrajectoryBuffer::build(&config(3, 0.99, 0.97))?;
        buffer.store(&[0.0, 0.0], &[0.0], 1.0, 0.0, 0.0)?;
        let err = buffer.get().unwrap_err();

        assert!(matches!(
            err.downcast_ref::<MonopodError>(),
            Some(MonopodError::BufferNotFull {
                len: 1,
                capacity: 3
            })
        ));
        Ok(())
    }

    #[test]
    fn test_get_resets_pointers() -> Result<()> {
        let mut buffer = TrajectoryBuffer::build(&config(2, 0.99, 0.97))?;
        for _ in 0..2 {
            buffer.store(&[1.0, 2.0], &[3.0], 1.0, 0.0, -0.5)?;
        }
        buffer.finish_path(0.0);
        let batch = buffer.get()?;

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.obs, vec![1.0, 2.0, 1.0, 2.0]);
        assert_eq!(batch.act, vec![3.0, 3.0]);
        assert_eq!(batch.logp, vec![-0.5, -0.5]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.path_start(), 0);
        buffer.store(&[1.0, 2.0], &[3.0], 1.0, 0.0, -0.5)?;
        Ok(())
    }

    #[test]
    fn test_shape_mismatch() -> Result<()> {
        let mut buffer = TrajectoryBuffer::build(&config(2, 0.99, 0.97))?;
        let err = buffer.store(&[0.0], &[0.0], 1.0, 0.0, 0.0).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<MonopodError>(),
            Some(MonopodError::ShapeMismatch { .. })
        ));
        assert!(buffer.is_empty());
        Ok(())
    }

    #[test]
    fn test_normalize_advantages() -> Result<()> {
        let mut buffer =
            TrajectoryBuffer::build(&config(3, 0.9, 0.9).normalize_advantages(true))?;
        for r in [1.0, 2.0, 3.0] {
            buffer.store(&[0.0, 0.0], &[0.0], r, 0.5, 0.0)?;
        }
        buffer.finish_path(0.0);
        let batch = buffer.get()?;
        let mean = batch.adv.iter().sum::<f32>() / 3.0;
        let var = batch.adv.iter().map(|a| (a - mean).powi(2)).sum::<f32>() / 3.0;

        assert!(mean.abs() < 1e-5);
        assert!((var - 1.0).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn test_invalid_config() {
        assert!(TrajectoryBuffer::build(&config(0, 0.99, 0.97)).is_err());
        assert!(TrajectoryBuffer::build(&config(10, 1.5, 0.97)).is_err());
        assert!(TrajectoryBuffer::build(&TrajectoryBufferConfig::default()).is_err());
    }
}
