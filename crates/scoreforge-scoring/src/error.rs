//! Score director errors.
//!
//! Configuration and usage errors come from `scoreforge-core`. Corruption
//! and staleness errors are raised only by the assertion subsystem and carry
//! rendered scores so they stay independent of the score type.

use std::fmt;

use scoreforge_config::ConfigError;
use scoreforge_core::{ConfigurationError, FactId, ListenerError, SchemaFingerprint, UsageError};
use thiserror::Error;

/// Every failure a score director can report.
#[derive(Debug, Error)]
pub enum ScoreDirectorError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("variable listener {listener} failed for {entity}: {source}")]
    ListenerFailed {
        listener: String,
        entity: FactId,
        source: ListenerError,
    },

    #[error(transparent)]
    ScoreCorruption(#[from] ScoreCorruptionError),

    #[error(transparent)]
    ShadowVariableStale(#[from] ShadowVariableStaleError),

    #[error("cloned working solution is corrupted: {0}")]
    CloneCorruption(String),

    #[error("working solution schema {actual} does not match factory schema {expected}")]
    SchemaMismatch {
        expected: SchemaFingerprint,
        actual: SchemaFingerprint,
    },
}

pub type Result<T> = std::result::Result<T, ScoreDirectorError>;

/// The incrementally maintained score diverged from a from-scratch recalculation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ScoreCorruptionError {
    /// Incremental score.
    pub working: String,
    /// From-scratch score.
    pub scratch: String,
    /// Where the divergence was detected, plus per-constraint differences.
    pub analysis: String,
    /// Matches the incremental network holds but a fresh network does not.
    pub excess: Vec<String>,
    /// Matches a fresh network holds but the incremental network lost.
    pub missing: Vec<String>,
}

impl fmt::Display for ScoreCorruptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "score corruption: working score {} is not the from-scratch score {}",
            self.working, self.scratch
        )?;
        if !self.analysis.is_empty() {
            writeln!(f, "  {}", self.analysis)?;
        }
        for m in &self.excess {
            writeln!(f, "  excess match: {}", m)?;
        }
        for m in &self.missing {
            writeln!(f, "  missing match: {}", m)?;
        }
        Ok(())
    }
}

/// One shadow variable whose stored value differs from what its listener computes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleShadow {
    pub listener: String,
    pub entity: FactId,
    pub variable: String,
    pub stale: String,
    pub fresh: String,
}

impl fmt::Display for StaleShadow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {} was {} but {} computes {}",
            self.variable, self.entity, self.stale, self.listener, self.fresh
        )
    }
}

/// Variable listeners left shadow variables stale.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ShadowVariableStaleError {
    pub violations: Vec<StaleShadow>,
}

impl ShadowVariableStaleError {
    /// Names of the offending listeners, without duplicates.
    pub fn listeners(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.violations.iter().map(|v| v.listener.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

impl fmt::Display for ShadowVariableStaleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stale shadow variables:")?;
        for violation in &self.violations {
            write!(f, "\n  {}", violation)?;
        }
        Ok(())
    }
}
