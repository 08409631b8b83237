//! Configuration system for ScoreForge.
//!
//! Load engine configuration from TOML or YAML to control assertion modes,
//! constraint match tracking and working-object lookup without code changes.
//!
//! # Examples
//!
//! ```
//! use scoreforge_config::{EngineConfig, EnvironmentMode, LookUpStrategyType};
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     environment_mode = "full_assert"
//!
//!     [score_director]
//!     constraint_match_enabled = true
//!     look_up_strategy = "none"
//!
//!     [score_director.constraint_weights]
//!     "Room conflict" = "-2hard/0soft"
//! "#).unwrap();
//!
//! assert_eq!(config.environment_mode, EnvironmentMode::FullAssert);
//! assert!(config.score_director.constraint_match_enabled);
//! assert_eq!(config.score_director.look_up_strategy, LookUpStrategyType::None);
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use scoreforge_config::EngineConfig;
//!
//! let config = EngineConfig::load("scoreforge.toml").unwrap_or_default();
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use scoreforge_core::ParseableScore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Environment mode controlling assertions.
    #[serde(default)]
    pub environment_mode: EnvironmentMode,

    #[serde(default)]
    pub score_director: ScoreDirectorConfig,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn with_environment_mode(mut self, mode: EnvironmentMode) -> Self {
        self.environment_mode = mode;
        self
    }

    pub fn with_constraint_match_enabled(mut self, enabled: bool) -> Self {
        self.score_director.constraint_match_enabled = enabled;
        self
    }

    pub fn with_look_up_strategy(mut self, strategy: LookUpStrategyType) -> Self {
        self.score_director.look_up_strategy = strategy;
        self
    }

    /// Overrides the weight of a constraint by its full name.
    pub fn with_constraint_weight(mut self, constraint: &str, weight: &str) -> Self {
        self.score_director
            .constraint_weights
            .insert(constraint.to_string(), weight.to_string());
        self
    }
}

/// Environment mode affecting assertions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentMode {
    /// No assertions.
    NonReproducible,

    /// No assertions; deterministic iteration.
    #[default]
    Reproducible,

    /// Compares every calculated score with a from-scratch recalculation.
    FastAssert,

    /// Also checks shadow variables for staleness and verifies undo moves.
    FullAssert,
}

impl EnvironmentMode {
    pub fn is_asserted(self) -> bool {
        matches!(self, EnvironmentMode::FastAssert | EnvironmentMode::FullAssert)
    }

    pub fn is_fully_asserted(self) -> bool {
        self == EnvironmentMode::FullAssert
    }
}

/// How external objects are mapped to working facts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookUpStrategyType {
    /// Match on class and planning id.
    #[default]
    PlanningId,

    /// Lookup disabled.
    None,
}

/// Score director configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ScoreDirectorConfig {
    /// Whether constraint matches are tracked for analysis.
    #[serde(default)]
    pub constraint_match_enabled: bool,

    #[serde(default)]
    pub look_up_strategy: LookUpStrategyType,

    /// Constraint weight overrides keyed by full constraint name.
    #[serde(default)]
    pub constraint_weights: BTreeMap<String, String>,
}

impl ScoreDirectorConfig {
    /// Parses the weight overrides into a concrete score type.
    ///
    /// # Examples
    ///
    /// ```
    /// use scoreforge_config::ScoreDirectorConfig;
    /// use scoreforge_core::HardSoftScore;
    ///
    /// let mut config = ScoreDirectorConfig::default();
    /// config.constraint_weights.insert("Overtime".into(), "0hard/-3soft".into());
    ///
    /// let weights = config.parsed_constraint_weights::<HardSoftScore>().unwrap();
    /// assert_eq!(weights["Overtime"], HardSoftScore::of(0, -3));
    /// ```
    pub fn parsed_constraint_weights<Sc: ParseableScore>(
        &self,
    ) -> Result<BTreeMap<String, Sc>, ConfigError> {
        self.constraint_weights
            .iter()
            .map(|(name, weight)| {
                Sc::parse(weight)
                    .map(|score| (name.clone(), score))
                    .map_err(|e| {
                        ConfigError::Invalid(format!("weight of constraint {}: {}", name, e))
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests;
