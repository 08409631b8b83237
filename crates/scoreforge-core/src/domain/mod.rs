//! Runtime domain model: schema, values, facts and listeners.

mod fact;
mod listener;
mod schema;
mod solution;
mod value;


pub use fact::{Fact, FactId, FactKey, FactStore};
pub use listener::{
    ListenerDeclaration, ListenerFactory, ShadowWriter, VariableListener, VariableNotification,
};
pub use schema::{
    ClassDef, ClassId, ClassKind, FieldDef, FieldKind, FieldRef, SchemaBuilder,
    SchemaFingerprint, SolutionSchema,
};
pub use solution::WorkingSolution;
pub use value::Value;
