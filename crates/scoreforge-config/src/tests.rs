//! Tests for engine configuration.

use scoreforge_core::{HardSoftScore, SimpleScore};

use super::*;

#[test]
fn test_toml_parsing() {
    let toml = r#"
        environment_mode = "fast_assert"

        [score_director]
        constraint_match_enabled = true

        [score_director.constraint_weights]
        "Row conflict" = "-5"
    "#;

    let config = EngineConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.environment_mode, EnvironmentMode::FastAssert);
    assert!(config.score_director.constraint_match_enabled);
    assert_eq!(
        config.score_director.look_up_strategy,
        LookUpStrategyType::PlanningId
    );
    let weights = config
        .score_director
        .parsed_constraint_weights::<SimpleScore>()
        .unwrap();
    assert_eq!(weights["Row conflict"], SimpleScore::of(-5));
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        environment_mode: full_assert
        score_director:
          look_up_strategy: none
    "#;

    let config = EngineConfig::from_yaml_str(yaml).unwrap();
    assert!(config.environment_mode.is_fully_asserted());
    assert_eq!(config.score_director.look_up_strategy, LookUpStrategyType::None);
    assert!(!config.score_director.constraint_match_enabled);
}

#[test]
fn test_defaults() {
    let config = EngineConfig::from_toml_str("").unwrap();
    assert_eq!(config, EngineConfig::default());
    assert!(!config.environment_mode.is_asserted());
}

#[test]
fn test_assertion_levels() {
    assert!(!EnvironmentMode::Reproducible.is_asserted());
    assert!(EnvironmentMode::FastAssert.is_asserted());
    assert!(!EnvironmentMode::FastAssert.is_fully_asserted());
    assert!(EnvironmentMode::FullAssert.is_asserted());
}

#[test]
fn test_invalid_weight_is_reported() {
    let config = EngineConfig::new().with_constraint_weight("Overlap", "heavy");
    let err = config
        .score_director
        .parsed_constraint_weights::<HardSoftScore>()
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("Overlap")));
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        EngineConfig::load("/nonexistent/scoreforge.toml"),
        Err(ConfigError::Io(_))
    ));
}
