//! Moves: reversible changes to the working solution.
//!
//! A move changes planning variables through the score director hooks and
//! returns the move that reverts it. Evaluating a candidate is then
//! do, score, do the inverse; see
//! [`IncrementalScoreDirector::evaluate_move`](crate::director::IncrementalScoreDirector::evaluate_move).

mod change;
mod swap;

#[cfg(test)]
mod tests;

use std::fmt::Debug;

use scoreforge_core::{FactId, Score};

use crate::director::ScoreDirector;
use crate::error::Result;

pub use change::ChangeMove;
pub use swap::SwapMove;

/// A move that modifies one or more planning variables.
///
/// # Implementation Notes
/// - Every variable change must go through the director hooks
/// - The returned inverse restores the exact prior values when done
///   immediately afterwards
pub trait Move<Sc: Score>: Send + Sync + Debug {
    /// Returns true if doing this move would change the working solution.
    fn is_doable(&self, score_director: &dyn ScoreDirector<Sc>) -> bool;

    /// Executes this move and returns the move that undoes it.
    fn do_move(&self, score_director: &mut dyn ScoreDirector<Sc>) -> Result<Box<dyn Move<Sc>>>;

    /// Returns the entities this move affects.
    fn entities(&self) -> &[FactId];
}
