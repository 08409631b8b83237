//! Error types for ScoreForge
//!
//! Configuration errors are raised while a schema, constraint network or
//! listener graph is being built. Usage errors signal a caller bug at a
//! mutation hook and are never recoverable.

use thiserror::Error;

use crate::domain::FactId;

/// A defect in the schema or network definition, detected before solving starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("cyclic shadow variable dependency: {cycle}")]
    CyclicShadowDependency { cycle: String },

    #[error("filtering joiner at position {filtering} precedes indexing joiner at position {indexing}")]
    JoinerOrder { filtering: usize, indexing: usize },

    #[error("class {class} requires a planning id but a fact has none")]
    MissingPlanningId { class: String },

    #[error("class {class} has more than one fact with planning id {id}")]
    DuplicatePlanningId { class: String, id: String },

    #[error("unknown class {class}")]
    UnknownClass { class: String },

    #[error("unknown field {class}.{field}")]
    UnknownField { class: String, field: String },

    #[error("duplicate class {class}")]
    DuplicateClass { class: String },

    #[error("duplicate field {class}.{field}")]
    DuplicateField { class: String, field: String },

    #[error("{class}.{field} is not a planning or shadow variable")]
    NotAVariable { class: String, field: String },

    #[error("{class}.{field} is not a shadow variable")]
    NotAShadowVariable { class: String, field: String },

    #[error("shadow variable {class}.{field} has no variable listener")]
    UnownedShadowVariable { class: String, field: String },

    #[error("shadow variable {class}.{field} is written by both {first} and {second}")]
    ShadowVariableOwnedTwice {
        class: String,
        field: String,
        first: String,
        second: String,
    },

    #[error("tuple arity {arity} exceeds the maximum of 4")]
    TupleArityExceeded { arity: usize },

    #[error("duplicate constraint {name}")]
    DuplicateConstraint { name: String },

    #[error("stream is not terminated with a constraint")]
    UnterminatedStream,
}

/// A caller bug detected at a mutation hook or query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("fact {fact} is not present in the working solution")]
    UnknownFact { fact: FactId },

    #[error("fact {fact} was never inserted")]
    FactNotInserted { fact: FactId },

    #[error("fact {fact} is already inserted")]
    FactAlreadyInserted { fact: FactId },

    #[error("fact {fact} is still present after its removal hook")]
    FactStillPresent { fact: FactId },

    #[error("fact {fact} is a {actual}, expected a {expected}")]
    WrongFactKind {
        fact: FactId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("variable {variable} does not belong to the class of fact {fact}")]
    ClassMismatch { fact: FactId, variable: String },

    #[error("shadow variable {variable} may only be changed by its variable listener")]
    ShadowMutationOutsideListener { variable: String },

    #[error("listener {listener} does not own shadow variable {variable}")]
    ShadowVariableNotOwned { variable: String, listener: String },

    #[error("{variable} is not a planning variable")]
    NotAVariable { variable: String },

    #[error("{hook} called for {fact} without a matching before hook")]
    UnpairedHook { hook: &'static str, fact: FactId },

    #[error("working object lookup is disabled")]
    LookUpDisabled,

    #[error("constraint match tracking is disabled")]
    ConstraintMatchDisabled,
}

/// Failure reported by a [`VariableListener`](crate::domain::VariableListener).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error("{0}")]
    Failed(String),
}
