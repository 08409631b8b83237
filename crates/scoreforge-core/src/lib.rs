//! ScoreForge Core - Core types for incremental score calculation
//!
//! This crate provides the fundamental abstractions for ScoreForge:
//! - Score types for representing solution quality
//! - A runtime schema describing fact classes, variables and listeners
//! - The fact store and working solution mutated by score directors
//! - Error types shared by every ScoreForge crate

pub mod constraint;
pub mod domain;
pub mod error;
pub mod score;

pub use constraint::{ConstraintRef, ImpactType};
pub use domain::{
    ClassId, ClassKind, Fact, FactId, FactStore, SchemaBuilder, SchemaFingerprint,
    FieldRef, SolutionSchema, Value, VariableListener, WorkingSolution,
};
pub use error::{ConfigurationError, ListenerError, UsageError};
pub use score::{
    HardMediumSoftScore, HardSoftDecimalScore, HardSoftScore, ParseableScore, Score,
    ScoreParseError, SimpleDecimalScore, SimpleScore, SolutionScore,
};
