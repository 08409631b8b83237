//! Score types for representing solution quality
//!
//! Scores are used to compare solutions and guide the optimization process.
//! All score types are immutable and implement arithmetic operations.

#[macro_use]
mod macros;

mod hard_medium_soft;
mod hard_soft;
mod hard_soft_decimal;
mod level;
mod simple;
mod simple_decimal;
mod solution;
mod traits;


pub use hard_medium_soft::HardMediumSoftScore;
pub use hard_soft::HardSoftScore;
pub use hard_soft_decimal::HardSoftDecimalScore;
pub use level::ScoreLevel;
pub use simple::SimpleScore;
pub use simple_decimal::SimpleDecimalScore;
pub use solution::SolutionScore;
pub use traits::{ParseableScore, Score, ScoreParseError};

use num_traits::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal product back onto an integer score level, saturating on overflow.
pub(crate) fn round_to_i64(value: Decimal) -> i64 {
    let fallback = if value.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    };
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(fallback)
}
