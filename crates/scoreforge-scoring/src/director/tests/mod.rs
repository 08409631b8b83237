//! Director tests.
//!
//! - `scenarios` - end-to-end scoring and shadow propagation
//! - `hooks` - hook pairing, usage errors, lookup and revisions
//! - `assertions` - corruption, staleness and clone checks
//! - `randomized` - incremental score against from-scratch recalculation
//! - `parallel` - independent directors sharing one factory

mod hooks;
mod parallel;
mod randomized;
mod scenarios;

use std::sync::Arc;

use scoreforge_config::{EngineConfig, EnvironmentMode};
use scoreforge_core::{SimpleScore, Value};
use scoreforge_test::{Assignment, ShadowChain};

use crate::director::{IncrementalScoreDirector, ScoreDirectorFactory};
use crate::stream::joiner::equal;
use crate::stream::{ConstraintFactory, Mapping};

/// Penalizes 1 per pair of entities assigned to the same slot.
fn conflict_factory(
    fixture: &Assignment,
    config: EngineConfig,
) -> Arc<ScoreDirectorFactory<SimpleScore>> {
    let value = fixture.value;
    let network = ConstraintFactory::define(fixture.schema.clone(), |factory| {
        factory
            .for_each_unique_pair("Entity", [equal(Mapping::field(0, value))])
            .penalize(SimpleScore::ONE)
            .as_constraint("Conflict");
    })
    .unwrap();
    Arc::new(ScoreDirectorFactory::new(network, config).unwrap())
}

fn conflict_director(
    fixture: &Assignment,
    config: EngineConfig,
    slots: &[&str],
    assignments: &[Option<usize>],
) -> (IncrementalScoreDirector<SimpleScore>, Vec<scoreforge_core::FactId>) {
    let factory = conflict_factory(fixture, config);
    let (solution, entities) = fixture.solution(slots, assignments);
    (factory.build_score_director(solution).unwrap(), entities)
}

/// Penalizes 1 per chained entity whose last shadow is still unset.
fn chain_director(fixture: &ShadowChain, mode: EnvironmentMode) -> IncrementalScoreDirector<SimpleScore> {
    let third = fixture.third;
    let network = ConstraintFactory::define(fixture.schema.clone(), |factory| {
        factory
            .for_each_including_unassigned("Chained")
            .filter(move |t| t.field(0, third).is_none())
            .penalize(SimpleScore::ONE)
            .as_constraint("Unsettled chain");
    })
    .unwrap();
    let config = EngineConfig::new().with_environment_mode(mode);
    let factory = Arc::new(ScoreDirectorFactory::new(network, config).unwrap());
    factory.build_score_director(fixture.empty()).unwrap()
}

fn text(s: &str) -> Value {
    Value::text(s)
}
