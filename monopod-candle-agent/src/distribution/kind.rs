use crate::{
    mlp::{Mlp, MlpConfig},
    model::SubModel1,
    Activation,
};
use anyhow::Result;
use candle_core::{Tensor, D};
use candle_nn::{Init, VarBuilder};
use serde::{Deserialize, Serialize};

fn default_log_std_init() -> f64 {
    -0.5
}

fn default_epsilon() -> f64 {
    1e-6
}

fn default_std_scale() -> f64 {
    0.15
}

/// Family of the action distribution of the policy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum DistributionKind {
    /// Gaussian with a state-independent diagonal standard deviation.
    DiagGaussian {
        /// Initial value of the log standard deviation.
        #[serde(default = "default_log_std_init")]
        log_std_init: f64,
    },

    /// [`DistributionKind::DiagGaussian`] followed by `tanh`.
    SquashedDiagGaussian {
        /// Initial value of the log standard deviation.
        #[serde(default = "default_log_std_init")]
        log_std_init: f64,

        /// Added inside the log of the change-of-variables correction.
        #[serde(default = "default_epsilon")]
        epsilon: f64,
    },

    /// Beta with both shape parameters given by the network.
    Beta,

    /// Beta parameterized by mean `u` and concentration `k`.
    BetaMeanConcentration,

    /// Beta parameterized by mean `u` and standard deviation `s * std_scale`.
    BetaMeanStd {
        /// Scale of the standard deviation head.
        #[serde(default = "default_std_scale")]
        std_scale: f64,
    },
}

impl Default for DistributionKind {
    fn default() -> Self {
        Self::DiagGaussian {
            log_std_init: default_log_std_init(),
        }
    }
}

impl DistributionKind {
    /// Default squashed Gaussian.
    pub fn squashed_diag_gaussian() -> Self {
        Self::SquashedDiagGaussian {
            log_std_init: default_log_std_init(),
            epsilon: default_epsilon(),
        }
    }

    /// Default mean/std Beta.
    pub fn beta_mean_std() -> Self {
        Self::BetaMeanStd {
            std_scale: default_std_scale(),
        }
    }

    /// Builds the network producing the raw parameters of this distribution.
    ///
    /// `activation` is the hidden activation of the networks. The raw Beta
    /// network and the concentration network use softplus regardless.
    pub fn build_output_layer(
        &self,
        vb: VarBuilder,
        obs_dim: usize,
        act_dim: usize,
        hidden_sizes: &[usize],
        activation: Activation,
    ) -> Result<PolicyHead> {
        let mlp = |name: &str, out_dim: usize, act: Activation, act_out: Activation| {
            let config = MlpConfig::new(obs_dim, hidden_sizes.to_vec(), out_dim, act, act_out);
            Mlp::build(vb.pp(name), config)
        };

        let head = match self {
            Self::DiagGaussian { log_std_init } | Self::SquashedDiagGaussian { log_std_init, .. } => {
                PolicyHead::Gaussian {
                    mean: mlp("mean", act_dim, activation, Activation::Identity)?,
                    log_std: vb.get_with_hints(act_dim, "log_std", Init::Const(*log_std_init))?,
                }
            }
            Self::Beta => PolicyHead::Beta {
                alpha_beta: mlp(
                    "alpha_beta",
                    2 * act_dim,
                    Activation::Softplus,
                    Activation::Softplus,
                )?,
            },
            Self::BetaMeanConcentration => PolicyHead::MeanConcentration {
                u: mlp("u", act_dim, activation, Activation::Sigmoid)?,
                k: mlp("k", act_dim, Activation::Softplus, Activation::Softplus)?,
            },
            Self::BetaMeanStd { .. } => PolicyHead::MeanStd {
                u: mlp("u", act_dim, activation, Activation::Sigmoid)?,
                s: mlp("s", act_dim, activation, Activation::Sigmoid)?,
            },
        };

        Ok(head)
    }
}

/// Networks producing the raw parameters of the action distribution.
pub enum PolicyHead {
    /// Mean network and the learned log standard deviation.
    Gaussian {
        /// Mean network.
        mean: Mlp,
        /// `(act_dim,)`.
        log_std: Tensor,
    },

    /// Single network emitting `(alpha, beta)` concatenated.
    Beta {
        /// Outputs `2 * act_dim` non-negative values.
        alpha_beta: Mlp,
    },

    /// Mean and concentration networks.
    MeanConcentration {
        /// Mean in `(0, 1)`.
        u: Mlp,
        /// Concentration minus one, non-negative.
        k: Mlp,
    },

    /// Mean and standard deviation networks.
    MeanStd {
        /// Mean in `(0, 1)`.
        u: Mlp,
        /// Standard deviation before scaling, in `(0, 1)`.
        s: Mlp,
    },
}

impl PolicyHead {
    /// Computes the raw parameters for a batch of observations.
    pub fn forward(&self, obs: &Tensor) -> Result<RawParams> {
        Ok(match self {
            Self::Gaussian { mean, log_std } => RawParams::Gaussian {
                mean: mean.forward(obs)?,
                log_std: log_std.clone(),
            },
            Self::Beta { alpha_beta } => {
                let xs = alpha_beta.forward(obs)?.chunk(2, D::Minus1)?;
                RawParams::Beta {
                    alpha: xs[0].clone(),
                    beta: xs[1].clone(),
                }
            }
            Self::MeanConcentration { u, k } => RawParams::MeanConcentration {
                u: u.forward(obs)?,
                k: (k.forward(obs)? + 1.0)?,
            },
            Self::MeanStd { u, s } => RawParams::MeanStd {
                u: u.forward(obs)?,
                s: s.forward(obs)?,
            },
        })
    }
}

/// Raw parameters emitted by [`PolicyHead`], of shape `(batch_size, act_dim)`
/// except `log_std`.
#[derive(Clone, Debug)]
pub enum RawParams {
    /// Mean and log standard deviation.
    Gaussian {
        /// Mean.
        mean: Tensor,
        /// Log standard deviation, `(act_dim,)`.
        log_std: Tensor,
    },

    /// Non-negative shapes before the shift by 1.
    Beta {
        /// First shape.
        alpha: Tensor,
        /// Second shape.
        beta: Tensor,
    },

    /// Mean and concentration, `k >= 1`.
    MeanConcentration {
        /// Mean.
        u: Tensor,
        /// Concentration.
        k: Tensor,
    },

    /// Mean and unscaled standard deviation.
    MeanStd {
        /// Mean.
        u: Tensor,
        /// Unscaled standard deviation.
        s: Tensor,
    },
}
