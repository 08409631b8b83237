//! Score director implementations.
//!
//! The score director is the facade between code that mutates a working
//! solution and the machinery that keeps its score current.
//!
//! # Components
//!
//! - [`ScoreDirector`] - hook trait used by moves and problem changes
//! - [`IncrementalScoreDirector`] - shadow propagation plus tuple network
//! - [`ScoreDirectorFactory`] - shared network definition and listener graph
//! - [`ScoreDirectorFactoryRegistry`] - factories keyed by schema fingerprint

mod factory;
mod incremental;
mod lookup;
mod pending;
mod registry;
mod traits;

#[cfg(test)]
mod tests;

pub use factory::ScoreDirectorFactory;
pub use incremental::IncrementalScoreDirector;
pub use registry::ScoreDirectorFactoryRegistry;
pub use traits::ScoreDirector;
