//! Fluent constraint stream API.
//!
//! Streams describe constraint patterns; they are compiled into a shared
//! [`NetworkDefinition`](crate::network::NetworkDefinition) that score
//! directors evaluate incrementally.

pub mod collector;
mod factory;
pub mod joiner;
mod mapping;
mod tuple_stream;

#[cfg(test)]
mod tests;

pub use collector::{Accumulator, Collector, Undo};
pub use factory::ConstraintFactory;
pub use joiner::Joiner;
pub use mapping::{BiPredicate, Mapping, Predicate};
pub use tuple_stream::{ConstraintBuilder, Stream};
