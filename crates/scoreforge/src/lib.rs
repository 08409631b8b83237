//! ScoreForge - incremental constraint scoring in Rust
//!
//! Describe a solution with a runtime schema, define constraints as streams
//! and let a score director keep the score current while you change it.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use scoreforge::prelude::*;
//!
//! let mut schema = SolutionSchema::builder();
//! let slot = schema.class(ClassDef::problem_fact("Slot").with_planning_id("id"))?;
//! let entity = schema.class(ClassDef::entity("Entity").with_planning_id("id").with_genuine("value"))?;
//! let schema = schema.build()?;
//! let (slot_id, entity_id) = (schema.field_ref("Slot", "id")?, schema.field_ref("Entity", "id")?);
//! let value = schema.field_ref("Entity", "value")?;
//!
//! let network = ConstraintFactory::define(Arc::clone(&schema), |factory| {
//!     factory
//!         .for_each_unique_pair("Entity", [joiner::equal(Mapping::field(0, value))])
//!         .penalize(SimpleScore::ONE)
//!         .as_constraint("Conflict");
//! })?;
//! let factory = Arc::new(ScoreDirectorFactory::new(network, EngineConfig::new())?);
//!
//! let mut solution = WorkingSolution::new(Arc::clone(&schema));
//! let a = solution.insert(Fact::new(&schema, slot).with(slot_id, "a"));
//! let b = solution.insert(Fact::new(&schema, slot).with(slot_id, "b"));
//! let first = solution.insert(Fact::new(&schema, entity).with(entity_id, 1).with(value, a));
//! solution.insert(Fact::new(&schema, entity).with(entity_id, 2).with(value, a));
//!
//! let mut director = factory.build_score_director(solution)?;
//! assert_eq!(director.calculate_score()?.score(), SimpleScore::of(-1));
//!
//! director.change_variable(first, value, Value::Ref(b))?;
//! assert_eq!(director.calculate_score()?.score(), SimpleScore::ZERO);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Score types
pub use scoreforge_core::score::{
    HardMediumSoftScore, HardSoftDecimalScore, HardSoftScore, ParseableScore, Score,
    SimpleDecimalScore, SimpleScore, SolutionScore,
};

// Schema and working solution
pub use scoreforge_core::domain;
pub use scoreforge_core::{ConfigurationError, ListenerError, UsageError};

// Configuration
pub use scoreforge_config::{
    ConfigError, EngineConfig, EnvironmentMode, LookUpStrategyType, ScoreDirectorConfig,
};

// Constraint stream API
pub use scoreforge_scoring::stream;

// Score directors, moves and analysis
pub use scoreforge_scoring::{
    ChangeMove, ConstraintMatchTotal, ConstraintWeightOverrides, IncrementalScoreDirector,
    Indictment, Move, ScoreDirector, ScoreDirectorError, ScoreDirectorFactory,
    ScoreDirectorFactoryRegistry, ScoreExplanation, SwapMove,
};

#[cfg(feature = "console")]
pub mod console;

pub mod prelude {
    pub use super::domain::{
        ClassDef, Fact, FactId, FieldRef, ListenerDeclaration, ShadowWriter, SolutionSchema,
        Value, VariableListener, WorkingSolution,
    };
    pub use super::stream::{collector, joiner, ConstraintFactory, Mapping};
    pub use super::{
        EngineConfig, EnvironmentMode, HardMediumSoftScore, HardSoftDecimalScore, HardSoftScore,
        Score, ScoreDirector, ScoreDirectorFactory, SimpleDecimalScore, SimpleScore,
    };
}
