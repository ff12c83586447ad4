//! Inverted pendulum swing-up, a stand-in for the monopod simulator.
//!
//! The dynamics follow the classic Gym `Pendulum-v1`. Observations are
//! `[cos θ, sin θ, θ']` and the action in `[-1, 1]` is scaled to the torque.
//! Episodes never terminate and are truncated after `max_steps` steps.
use anyhow::Result;
use log::trace;
use monopod_core::{
    record::{Record, RecordValue},
    Env, Step,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

const MAX_SPEED: f32 = 8.0;
const MAX_TORQUE: f32 = 2.0;
const DT: f32 = 0.05;
const G: f32 = 10.0;
const M: f32 = 1.0;
const L: f32 = 1.0;

/// Dimension of observations.
pub const OBS_DIM: usize = 3;

/// Dimension of actions.
pub const ACT_DIM: usize = 1;

/// Wraps an angle into `[-π, π)`.
fn angle_normalize(x: f32) -> f32 {
    (x + PI).rem_euclid(2.0 * PI) - PI
}

/// Configuration of [`Pendulum`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PendulumConfig {
    /// Steps after which an episode is truncated.
    pub max_steps: usize,

    /// Initial angle is drawn from `[-init_theta_range, init_theta_range]`.
    pub init_theta_range: f32,

    /// Initial angular velocity is drawn from `[-init_theta_dot_range, init_theta_dot_range]`.
    pub init_theta_dot_range: f32,
}

impl Default for PendulumConfig {
    fn default() -> Self {
        Self {
            max_steps: 200,
            init_theta_range: PI,
            init_theta_dot_range: 1.0,
        }
    }
}

impl PendulumConfig {
    /// Sets the number of steps after which an episode is truncated.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }
}

/// Inverted pendulum.
pub struct Pendulum {
    config: PendulumConfig,
    seed: u64,
    rng: StdRng,
    theta: f32,
    theta_dot: f32,
    t: usize,
}

impl Pendulum {
    fn obs(&self) -> Vec<f32> {
        vec![self.theta.cos(), self.theta.sin(), self.theta_dot]
    }

    fn reset_state(&mut self) -> Vec<f32> {
        let (a, b) = (self.config.init_theta_range, self.config.init_theta_dot_range);
        self.theta = self.rng.gen_range(-a..=a);
        self.theta_dot = self.rng.gen_range(-b..=b);
        self.t = 0;
        trace!("Reset: theta = {}, theta_dot = {}", self.theta, self.theta_dot);
        self.obs()
    }
}

impl Env for Pendulum {
    type Config = PendulumConfig;
    type Obs = Vec<f32>;
    type Act = Vec<f32>;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let seed = seed as u64;
        Ok(Self {
            config: config.clone(),
            seed,
            rng: StdRng::seed_from_u64(seed),
            theta: 0.0,
            theta_dot: 0.0,
            t: 0,
        })
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        let torque = (a.first().copied().unwrap_or(0.0) * MAX_TORQUE).clamp(-MAX_TORQUE, MAX_TORQUE);
        let (theta, theta_dot) = (self.theta, self.theta_dot);
        let theta_norm = angle_normalize(theta);
        let cost = theta_norm * theta_norm + 0.1 * theta_dot * theta_dot + 0.001 * torque * torque;

        let theta_dot = theta_dot + (3.0 * G / (2.0 * L) * theta.sin() + 3.0 / (M * L * L) * torque) * DT;
        self.theta_dot = theta_dot.clamp(-MAX_SPEED, MAX_SPEED);
        self.theta = angle_normalize(theta + self.theta_dot * DT);
        self.t += 1;

        let is_truncated = self.t >= self.config.max_steps;
        let step = Step::new(self.obs(), a.clone(), -cost, false, is_truncated, ());
        let record = Record::from_slice(&[("torque", RecordValue::Scalar(torque))]);

        Ok((step, record))
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        Ok(self.reset_state())
    }

    /// Resets with the initial state drawn from a generator seeded by `seed + ix`.
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.rng = StdRng::seed_from_u64(self.seed.wrapping_add(ix as u64));
        Ok(self.reset_state())
    }
}
