use std::sync::Arc;

use scoreforge_config::{EngineConfig, EnvironmentMode};
use scoreforge_core::{SimpleScore, SolutionScore, Value};
use scoreforge_test::{Assignment, Diamond, ShadowChain};

use super::{chain_director, conflict_director, text};
use crate::director::{ScoreDirector, ScoreDirectorFactory};
use crate::error::ScoreDirectorError;
use crate::stream::collector::count;
use crate::stream::{ConstraintFactory, Mapping};

#[test]
fn test_same_value_pair_is_penalized_until_reassigned() {
    let fixture = Assignment::new();
    let (mut director, entities) = conflict_director(
        &fixture,
        EngineConfig::default(),
        &["v1", "v2"],
        &[Some(0), Some(0)],
    );
    assert_eq!(director.calculate_score().unwrap(), SolutionScore::of(SimpleScore::of(-1)));

    let v2 = fixture.slots(director.working_solution())[1];
    director
        .change_variable(entities[1], fixture.value, Value::Ref(v2))
        .unwrap();
    assert_eq!(director.calculate_score().unwrap(), SolutionScore::of(SimpleScore::ZERO));
    assert_eq!(director.calculation_count(), 2);
}

#[test]
fn test_group_match_retracted_when_count_drops() {
    let fixture = Assignment::new();
    let network = ConstraintFactory::define(fixture.schema.clone(), |factory| {
        factory
            .for_each("Entity")
            .group_by_collect(Mapping::custom(|_| Value::text("G")), count())
            .filter(|group| group.get(1).as_int().unwrap_or(0) > 2)
            .penalize(SimpleScore::ONE)
            .as_constraint("Crowded");
    })
    .unwrap();
    let config = EngineConfig::new().with_constraint_match_enabled(true);
    let factory = Arc::new(ScoreDirectorFactory::new(network, config).unwrap());
    let (solution, entities) = fixture.solution(&["v1"], &[Some(0), Some(0), Some(0)]);
    let mut director = factory.build_score_director(solution).unwrap();

    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::of(-1));
    let totals = director.constraint_match_totals().unwrap();
    assert_eq!(totals[0].match_count, 1);
    assert_eq!(totals[0].matches[0].justification, vec![text("G"), Value::Int(3)]);

    director.remove_entity(entities[0]).unwrap();
    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::ZERO);
    assert_eq!(director.constraint_match_totals().unwrap()[0].match_count, 0);
    assert_eq!(director.network().group_count(), 1);
}

#[test]
fn test_shadow_chain_settles_in_one_trigger() {
    let fixture = ShadowChain::new();
    let mut director = chain_director(&fixture, EnvironmentMode::Reproducible);
    let entity = director.add_entity(fixture.entity(1)).unwrap();
    director.trigger_variable_listeners().unwrap();
    assert_eq!(
        director.calculate_score().unwrap(),
        SolutionScore::uninitialized(-1, SimpleScore::of(-1))
    );
    fixture.log.clear();

    director.change_variable(entity, fixture.x, text("1")).unwrap();
    director.trigger_variable_listeners().unwrap();

    let store = director.working_solution().store();
    assert_eq!(store.value(entity, fixture.first), &text("1/firstShadow"));
    assert_eq!(store.value(entity, fixture.second), &text("1/firstShadow/secondShadow"));
    assert_eq!(
        store.value(entity, fixture.third),
        &text("1/firstShadow/secondShadow/thirdShadow")
    );
    assert_eq!(
        fixture.log.entries(),
        vec!["FirstShadowListener", "SecondShadowListener", "ThirdShadowListener"]
    );

    // Nothing queued: a second trigger fires nothing.
    director.trigger_variable_listeners().unwrap();
    assert_eq!(fixture.log.entries().len(), 3);
    assert_eq!(director.calculate_score().unwrap(), SolutionScore::of(SimpleScore::ZERO));
}

#[test]
fn test_broken_listener_reported_as_stale() {
    let fixture = ShadowChain::broken();
    let mut director = chain_director(&fixture, EnvironmentMode::FullAssert);
    let entity = director.add_entity(fixture.entity(7)).unwrap();
    director.calculate_score().unwrap();

    director.change_variable(entity, fixture.x, text("1")).unwrap();
    let err = director.calculate_score().unwrap_err();
    let ScoreDirectorError::ShadowVariableStale(stale) = err else {
        panic!("expected stale shadow error, got {err}");
    };
    assert_eq!(stale.listeners(), vec!["FirstShadowListener"]);
    assert_eq!(stale.violations.len(), 1);
    assert_eq!(stale.violations[0].entity, entity);
    assert_eq!(stale.violations[0].variable, "Chained.first");
    assert_eq!(stale.violations[0].fresh, "1/firstShadow");
}

#[test]
fn test_stale_check_is_explicit_outside_assert_modes() {
    let fixture = ShadowChain::broken();
    let mut director = chain_director(&fixture, EnvironmentMode::Reproducible);
    let entity = director.add_entity(fixture.entity(7)).unwrap();
    director.change_variable(entity, fixture.x, text("1")).unwrap();

    // The broken listener goes unnoticed on the hot path.
    director.calculate_score().unwrap();
    assert!(director.working_solution().store().value(entity, fixture.first).is_none());

    let err = director.assert_shadow_variables_are_not_stale().unwrap_err();
    assert!(err.to_string().contains("FirstShadowListener"));

    // A failed check leaves the stale values and the score untouched.
    let store = director.working_solution().store();
    assert!(store.value(entity, fixture.first).is_none());
    assert!(store.value(entity, fixture.third).is_none());
    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::of(-1));
    let again = director.assert_shadow_variables_are_not_stale().unwrap_err();
    assert_eq!(again.to_string(), err.to_string());
}

#[test]
fn test_diamond_sink_fires_once_after_both_branches() {
    let fixture = Diamond::new();
    let d = fixture.d;
    let network = ConstraintFactory::define(fixture.schema.clone(), |factory| {
        factory
            .for_each_including_unassigned("Node")
            .filter(move |t| t.field(0, d).is_none())
            .penalize(SimpleScore::ONE)
            .as_constraint("Unsettled node");
    })
    .unwrap();
    let factory = Arc::new(ScoreDirectorFactory::new(network, EngineConfig::default()).unwrap());
    let mut director = factory.build_score_director(fixture.empty()).unwrap();
    let node = director.add_entity(fixture.node()).unwrap();
    director.trigger_variable_listeners().unwrap();
    fixture.log.clear();

    director.change_variable(node, fixture.a, text("A")).unwrap();
    director.trigger_variable_listeners().unwrap();

    let fired = fixture.log.entries();
    assert_eq!(fired.len(), 3);
    assert_eq!(fixture.log.count("BListener"), 1);
    assert_eq!(fixture.log.count("CListener"), 1);
    assert_eq!(fired[2], "DListener");
    assert_eq!(
        director.working_solution().store().value(node, d),
        &text("A/b+A/c/d")
    );
    assert_eq!(director.calculate_score().unwrap(), SolutionScore::of(SimpleScore::ZERO));
}
