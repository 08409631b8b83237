//! Shadow variable propagation.
//!
//! Listeners are compiled once per factory into a [`ShadowGraph`]; every
//! director owns a [`ShadowEngine`] with its own listener instances.

mod engine;
mod graph;
mod queue;

#[cfg(test)]
mod tests;

pub use engine::ShadowEngine;
pub use graph::ShadowGraph;
