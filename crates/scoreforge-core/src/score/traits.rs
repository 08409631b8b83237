//! Core Score trait definition

use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::ops::{Add, Neg, Sub};

use rust_decimal::Decimal;

use super::ScoreLevel;

/// Core trait for all score types in ScoreForge.
///
/// Scores are immutable values compared level by level, highest priority
/// first. Constraint weights are scores too: a match contributes its
/// constraint weight, optionally multiplied by a match weight.
pub trait Score:
    Copy
    + Debug
    + Display
    + Default
    + Send
    + Sync
    + PartialEq
    + Eq
    + Hash
    + PartialOrd
    + Ord
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// Returns true if all hard levels are non-negative.
    fn is_feasible(&self) -> bool;

    /// Returns the zero score (identity element for addition).
    fn zero() -> Self;

    /// Returns the number of score levels.
    fn levels_count() -> usize;

    /// Multiplies every level by an integer match weight.
    fn multiply(&self, multiplicand: i64) -> Self;

    /// Multiplies every level by a decimal match weight.
    ///
    /// Integer-backed scores round the product half away from zero.
    fn multiply_decimal(&self, multiplicand: Decimal) -> Self;

    /// Returns the absolute value of this score.
    fn abs(&self) -> Self;

    /// Returns the semantic label for the score level at the given index.
    ///
    /// # Panics
    /// Panics if `index >= levels_count()`.
    fn level_label(index: usize) -> ScoreLevel;

    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn is_better_than(&self, other: &Self) -> bool {
        self > other
    }

    fn is_worse_than(&self, other: &Self) -> bool {
        self < other
    }
}

/// Scores that can be parsed from their display form.
pub trait ParseableScore: Score {
    /// Parses a score from a string representation.
    ///
    /// # Format
    /// - SimpleScore: "42"
    /// - HardSoftScore: "0hard/-100soft"
    /// - HardSoftDecimalScore: "-1.5hard/0soft"
    fn parse(s: &str) -> Result<Self, ScoreParseError>;

    fn to_string_repr(&self) -> String;
}

/// Error when parsing a score from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreParseError {
    pub message: String,
}

impl std::fmt::Display for ScoreParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Score parse error: {}", self.message)
    }
}

impl std::error::Error for ScoreParseError {}
