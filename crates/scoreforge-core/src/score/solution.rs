//! SolutionScore - constraint score paired with an initialization score

use std::cmp::Ordering;
use std::fmt;

use super::traits::Score;

/// The score reported for a working solution.
///
/// `init_score` is the negated number of uninitialized genuine variables.
/// It is compared before the constraint score, so any initialized solution
/// beats any uninitialized one.
///
/// # Examples
///
/// ```
/// use scoreforge_core::{SimpleScore, SolutionScore};
///
/// let partial = SolutionScore::uninitialized(-2, SimpleScore::of(0));
/// let complete = SolutionScore::of(SimpleScore::of(-50));
///
/// assert!(complete > partial);
/// assert_eq!(partial.to_string(), "-2init/0");
/// assert_eq!(complete.to_string(), "-50");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct SolutionScore<Sc> {
    init_score: i64,
    score: Sc,
}

impl<Sc: Score> SolutionScore<Sc> {
    /// A score for a fully initialized solution.
    pub fn of(score: Sc) -> Self {
        SolutionScore {
            init_score: 0,
            score,
        }
    }

    pub fn uninitialized(init_score: i64, score: Sc) -> Self {
        SolutionScore { init_score, score }
    }

    pub fn zero() -> Self {
        SolutionScore::of(Sc::zero())
    }

    #[inline]
    pub fn init_score(&self) -> i64 {
        self.init_score
    }

    #[inline]
    pub fn score(&self) -> Sc {
        self.score
    }

    pub fn is_solution_initialized(&self) -> bool {
        self.init_score >= 0
    }

    pub fn is_feasible(&self) -> bool {
        self.is_solution_initialized() && self.score.is_feasible()
    }
}

impl<Sc: Score> Ord for SolutionScore<Sc> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.init_score
            .cmp(&other.init_score)
            .then_with(|| self.score.cmp(&other.score))
    }
}

impl<Sc: Score> PartialOrd for SolutionScore<Sc> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Sc: Score> fmt::Display for SolutionScore<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.init_score == 0 {
            write!(f, "{}", self.score)
        } else {
            write!(f, "{}init/{}", self.init_score, self.score)
        }
    }
}

impl<Sc: Score> From<Sc> for SolutionScore<Sc> {
    fn from(score: Sc) -> Self {
        SolutionScore::of(score)
    }
}
