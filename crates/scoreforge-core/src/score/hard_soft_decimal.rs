//! HardSoftDecimalScore - Hard/soft score with arbitrary-precision levels

use std::fmt;

use rust_decimal::Decimal;

use super::traits::Score;
use super::ScoreLevel;

/// A hard/soft score whose levels are [`Decimal`] values.
///
/// Comparison and arithmetic are exact; no fixed scale is imposed.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use scoreforge_core::HardSoftDecimalScore;
///
/// let score = HardSoftDecimalScore::of(Decimal::ZERO, Decimal::new(-2075, 1));
/// assert_eq!(score.to_string(), "0hard/-207.5soft");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HardSoftDecimalScore {
    hard: Decimal,
    soft: Decimal,
}

impl HardSoftDecimalScore {
    pub const ZERO: HardSoftDecimalScore = HardSoftDecimalScore {
        hard: Decimal::ZERO,
        soft: Decimal::ZERO,
    };

    pub const ONE_HARD: HardSoftDecimalScore = HardSoftDecimalScore {
        hard: Decimal::ONE,
        soft: Decimal::ZERO,
    };

    pub const ONE_SOFT: HardSoftDecimalScore = HardSoftDecimalScore {
        hard: Decimal::ZERO,
        soft: Decimal::ONE,
    };

    #[inline]
    pub const fn of(hard: Decimal, soft: Decimal) -> Self {
        HardSoftDecimalScore { hard, soft }
    }

    /// Creates a score from whole-number levels.
    pub fn of_units(hard: i64, soft: i64) -> Self {
        HardSoftDecimalScore::of(Decimal::from(hard), Decimal::from(soft))
    }

    #[inline]
    pub const fn hard(&self) -> Decimal {
        self.hard
    }

    #[inline]
    pub const fn soft(&self) -> Decimal {
        self.soft
    }
}

impl Score for HardSoftDecimalScore {
    #[inline]
    fn is_feasible(&self) -> bool {
        self.hard >= Decimal::ZERO
    }

    #[inline]
    fn zero() -> Self {
        HardSoftDecimalScore::ZERO
    }

    #[inline]
    fn levels_count() -> usize {
        2
    }

    impl_score_scale!(decimal HardSoftDecimalScore { hard, soft } => of);

    fn level_label(index: usize) -> ScoreLevel {
        match index {
            0 => ScoreLevel::Hard,
            1 => ScoreLevel::Soft,
            _ => panic!("HardSoftDecimalScore has 2 levels, got index {}", index),
        }
    }
}

impl_score_ops!(HardSoftDecimalScore { hard, soft } => of);

impl fmt::Debug for HardSoftDecimalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HardSoftDecimalScore({}, {})",
            self.hard.normalize(),
            self.soft.normalize()
        )
    }
}

impl fmt::Display for HardSoftDecimalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}hard/{}soft",
            self.hard.normalize(),
            self.soft.normalize()
        )
    }
}

impl_score_parse!(HardSoftDecimalScore { hard => "hard", soft => "soft" } : Decimal => of);
