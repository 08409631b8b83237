//! Shared test fixtures for ScoreForge crates.
//!
//! This crate provides schemas, solutions and variable listeners for testing.
//! It does NOT depend on `scoreforge-scoring` to avoid circular dependencies.
//!
//! - [`assignment`] - entities assigned to problem-fact values (pair conflicts, grouping)
//! - [`schedule`] - shifts with start/end times assigned to employees (joins, existence)
//! - [`shadow`] - shadow chains, diamonds, broken and cyclic listeners
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! scoreforge-test = { workspace = true }
//! ```

pub mod assignment;
pub mod schedule;
pub mod shadow;

pub use assignment::Assignment;
pub use schedule::Schedule;
pub use shadow::{cyclic_schema, Diamond, ShadowChain};
