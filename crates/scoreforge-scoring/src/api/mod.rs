//! Public API types: score analysis and constraint weight overrides.

pub mod analysis;
pub mod weight_overrides;

#[cfg(test)]
mod analysis_tests;
