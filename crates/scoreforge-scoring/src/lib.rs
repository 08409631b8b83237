//! Incremental constraint scoring for ScoreForge.
//!
//! This crate provides:
//! - A fluent constraint stream API compiled into a shared tuple network
//! - Incremental score directors driven by paired change hooks
//! - Shadow variable propagation over a listener dependency graph
//! - Assertion modes that compare incremental state against a fresh recalculation
//!
//! # Architecture
//!
//! A [`NetworkDefinition`](network::NetworkDefinition) is immutable and
//! shared between directors through a [`ScoreDirectorFactory`]. Each
//! [`IncrementalScoreDirector`] owns its working solution, its runtime
//! [`TupleNetwork`](network::TupleNetwork) and its [`ShadowEngine`](shadow::ShadowEngine).

pub mod api;
pub mod director;
pub mod error;
pub mod inliner;
pub mod moves;
pub mod network;
pub mod shadow;
pub mod stream;

// ============================================================================
// Score Directors
// ============================================================================

pub use director::{
    IncrementalScoreDirector, ScoreDirector, ScoreDirectorFactory, ScoreDirectorFactoryRegistry,
};
pub use error::{
    Result, ScoreCorruptionError, ScoreDirectorError, ShadowVariableStaleError, StaleShadow,
};

// ============================================================================
// Moves
// ============================================================================

pub use moves::{ChangeMove, Move, SwapMove};

// ============================================================================
// Analysis and weights
// ============================================================================

pub use api::analysis::{
    ConstraintMatch, ConstraintMatchDiff, ConstraintMatchTotal, Indictment, IndictmentMap,
    ScoreExplanation,
};
pub use api::weight_overrides::ConstraintWeightOverrides;

// ============================================================================
// Fluent Constraint Stream API
// ============================================================================

pub use network::{NetworkDefinition, TupleView};
pub use stream::{ConstraintBuilder, ConstraintFactory, Mapping, Predicate, Stream};
