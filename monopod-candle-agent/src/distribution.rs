//! Action distributions of the policy.
//!
//! [`DistributionKind`] in the agent configuration selects the family.
//! It builds the [`PolicyHead`], whose [`RawParams`] output for a batch of
//! observations is bound to an [`ActionDistribution`] with
//! [`ActionDistribution::bind`].
//!
//! All families act on `[-1, 1]`-scaled actions except the unsquashed Gaussian.
mod base;
mod beta;
mod gaussian;
mod kind;
pub mod special;
mod squashed;
pub use base::ActionDistribution;
pub use beta::Beta;
pub use gaussian::DiagGaussian;
pub use kind::{DistributionKind, PolicyHead, RawParams};
pub use squashed::SquashedDiagGaussian;
