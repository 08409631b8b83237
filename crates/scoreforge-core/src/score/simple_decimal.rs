//! SimpleDecimalScore - Single-level arbitrary-precision score

use std::fmt;

use rust_decimal::Decimal;

use super::traits::{ParseableScore, Score, ScoreParseError};
use super::ScoreLevel;

/// A single-level score backed by [`Decimal`].
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use scoreforge_core::{Score, SimpleDecimalScore};
///
/// let score = SimpleDecimalScore::of(Decimal::new(-15, 1));
/// assert_eq!(score.to_string(), "-1.5");
/// assert!(!score.is_feasible());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimpleDecimalScore {
    score: Decimal,
}

impl SimpleDecimalScore {
    pub const ZERO: SimpleDecimalScore = SimpleDecimalScore {
        score: Decimal::ZERO,
    };

    pub const ONE: SimpleDecimalScore = SimpleDecimalScore { score: Decimal::ONE };

    #[inline]
    pub const fn of(score: Decimal) -> Self {
        SimpleDecimalScore { score }
    }

    #[inline]
    pub const fn score(&self) -> Decimal {
        self.score
    }
}

impl Score for SimpleDecimalScore {
    #[inline]
    fn is_feasible(&self) -> bool {
        self.score >= Decimal::ZERO
    }

    #[inline]
    fn zero() -> Self {
        SimpleDecimalScore::ZERO
    }

    #[inline]
    fn levels_count() -> usize {
        1
    }

    impl_score_scale!(decimal SimpleDecimalScore { score } => of);

    fn level_label(index: usize) -> ScoreLevel {
        match index {
            0 => ScoreLevel::Soft,
            _ => panic!("SimpleDecimalScore has 1 level, got index {}", index),
        }
    }
}

impl_score_ops!(SimpleDecimalScore { score } => of);

impl fmt::Debug for SimpleDecimalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimpleDecimalScore({})", self.score.normalize())
    }
}

impl fmt::Display for SimpleDecimalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.score.normalize())
    }
}

impl ParseableScore for SimpleDecimalScore {
    fn parse(s: &str) -> Result<Self, ScoreParseError> {
        let s = s.trim();
        s.parse::<Decimal>()
            .map(SimpleDecimalScore::of)
            .map_err(|e| ScoreParseError {
                message: format!("Invalid SimpleDecimalScore '{}': {}", s, e),
            })
    }

    fn to_string_repr(&self) -> String {
        self.to_string()
    }
}
