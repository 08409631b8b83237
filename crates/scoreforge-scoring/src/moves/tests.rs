use std::sync::Arc;

use scoreforge_config::EngineConfig;
use scoreforge_core::{FactId, SimpleScore, Value};
use scoreforge_test::Assignment;

use super::*;
use crate::director::{IncrementalScoreDirector, ScoreDirector, ScoreDirectorFactory};
use crate::stream::joiner::equal;
use crate::stream::{ConstraintFactory, Mapping};

fn director(
    fixture: &Assignment,
    assignments: &[Option<usize>],
) -> (IncrementalScoreDirector<SimpleScore>, Vec<FactId>, Vec<FactId>) {
    let value = fixture.value;
    let network = ConstraintFactory::define(fixture.schema.clone(), |factory| {
        factory
            .for_each_unique_pair("Entity", [equal(Mapping::field(0, value))])
            .penalize(SimpleScore::ONE)
            .as_constraint("Conflict");
    })
    .unwrap();
    let factory = Arc::new(ScoreDirectorFactory::new(network, EngineConfig::new()).unwrap());
    let (solution, entities) = fixture.solution(&["v1", "v2"], assignments);
    let slots = fixture.slots(&solution);
    (factory.build_score_director(solution).unwrap(), entities, slots)
}

#[test]
fn test_change_move_inverse_restores_value() {
    let fixture = Assignment::new();
    let (mut director, entities, slots) = director(&fixture, &[Some(0), Some(0)]);
    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::of(-1));

    let change = ChangeMove::new(entities[1], fixture.value, slots[1]);
    assert!(Move::<SimpleScore>::is_doable(&change, &director));
    assert_eq!(Move::<SimpleScore>::entities(&change), &[entities[1]]);

    let undo = Move::<SimpleScore>::do_move(&change, &mut director).unwrap();
    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::ZERO);
    assert!(!Move::<SimpleScore>::is_doable(&change, &director));
    assert!(undo.is_doable(&director));

    undo.do_move(&mut director).unwrap();
    assert_eq!(fixture.value_of(director.working_solution(), entities[1]), Value::Ref(slots[0]));
    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::of(-1));
}

#[test]
fn test_change_move_to_unassigned() {
    let fixture = Assignment::new();
    let (mut director, entities, _) = director(&fixture, &[Some(0), Some(0)]);

    let change = ChangeMove::new(entities[0], fixture.value, Value::None);
    let undo = Move::<SimpleScore>::do_move(&change, &mut director).unwrap();
    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::ZERO);
    assert!(!director.calculate_score().unwrap().is_solution_initialized());

    undo.do_move(&mut director).unwrap();
    let score = director.calculate_score().unwrap();
    assert!(score.is_solution_initialized());
    assert_eq!(score.score(), SimpleScore::of(-1));
}

#[test]
fn test_swap_move_is_its_own_inverse() {
    let fixture = Assignment::new();
    let (mut director, entities, slots) = director(&fixture, &[Some(0), Some(0), Some(1)]);
    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::of(-1));

    let swap = SwapMove::new(entities[1], entities[2], [fixture.value]);
    assert!(Move::<SimpleScore>::is_doable(&swap, &director));
    let undo = Move::<SimpleScore>::do_move(&swap, &mut director).unwrap();
    assert_eq!(fixture.value_of(director.working_solution(), entities[1]), Value::Ref(slots[1]));
    assert_eq!(fixture.value_of(director.working_solution(), entities[2]), Value::Ref(slots[0]));
    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::of(-1));
    assert_eq!(undo.entities(), &[entities[1], entities[2]]);

    undo.do_move(&mut director).unwrap();
    assert_eq!(fixture.value_of(director.working_solution(), entities[1]), Value::Ref(slots[0]));
    assert_eq!(fixture.value_of(director.working_solution(), entities[2]), Value::Ref(slots[1]));
}

#[test]
fn test_swap_move_not_doable_without_difference() {
    let fixture = Assignment::new();
    let (director, entities, _) = director(&fixture, &[Some(0), Some(0)]);

    let equal_values = SwapMove::new(entities[0], entities[1], [fixture.value]);
    let same_entity = SwapMove::new(entities[0], entities[0], [fixture.value]);
    assert!(!Move::<SimpleScore>::is_doable(&equal_values, &director));
    assert!(!Move::<SimpleScore>::is_doable(&same_entity, &director));
}
