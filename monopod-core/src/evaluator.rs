//! Evaluate [`Agent`].
use crate::{record::Record, Agent, Env};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Evaluate [`Agent`].
pub trait Evaluator<E: Env> {
    /// Evaluate [`Agent`].
    ///
    /// The caller of this method needs to handle the internal state of `agent`,
    /// like training/evaluation mode.
    fn evaluate<A>(&mut self, agent: &mut A) -> Result<Record>
    where
        A: Agent<E>;
}
