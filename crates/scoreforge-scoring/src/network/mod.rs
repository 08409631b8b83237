//! The tuple network: node definitions, their runtime memories and the
//! propagation of fact changes to constraint matches.

pub(crate) mod builder;
mod definition;
mod index;
pub(crate) mod nodes;
mod runtime;
mod view;


pub use builder::MAX_ARITY;
pub use definition::{
    ConstraintDefinition, ExistenceMode, InputSide, MatchWeigher, NetworkDefinition,
    NodeDefinition, NodeId, NodeKind,
};
pub use runtime::TupleNetwork;
pub use view::TupleView;
