use std::sync::Arc;

use scoreforge_config::{EngineConfig, EnvironmentMode, LookUpStrategyType};
use scoreforge_core::domain::{ClassDef, ListenerDeclaration, ShadowWriter, VariableListener};
use scoreforge_core::{
    ConfigurationError, Fact, FactId, FieldRef, ListenerError, SimpleScore, SolutionSchema,
    UsageError, Value, WorkingSolution,
};
use scoreforge_test::{Assignment, ShadowChain};

use super::{chain_director, conflict_director, conflict_factory, text};
use crate::api::weight_overrides::ConstraintWeightOverrides;
use crate::director::{ScoreDirector, ScoreDirectorFactory};
use crate::error::ScoreDirectorError;
use crate::stream::joiner::equal;
use crate::stream::{ConstraintFactory, Mapping};

fn usage(err: ScoreDirectorError) -> UsageError {
    match err {
        ScoreDirectorError::Usage(usage) => usage,
        other => panic!("expected usage error, got {other}"),
    }
}

#[test]
fn test_after_hook_without_before_hook() {
    let fixture = Assignment::new();
    let (mut director, entities) =
        conflict_director(&fixture, EngineConfig::default(), &["v1"], &[Some(0)]);
    let err = director
        .after_variable_changed(entities[0], fixture.value)
        .unwrap_err();
    assert_eq!(
        usage(err),
        UsageError::UnpairedHook {
            hook: "after_variable_changed",
            fact: entities[0],
        }
    );
}

#[test]
fn test_shadow_variable_cannot_be_changed_by_a_move() {
    let fixture = ShadowChain::new();
    let mut director = chain_director(&fixture, EnvironmentMode::Reproducible);
    let entity = director.add_entity(fixture.entity(1)).unwrap();
    let err = director
        .change_variable(entity, fixture.first, text("forged"))
        .unwrap_err();
    assert_eq!(
        usage(err),
        UsageError::ShadowMutationOutsideListener {
            variable: "Chained.first".to_string(),
        }
    );
}

#[test]
fn test_plain_field_is_not_a_variable() {
    let fixture = Assignment::new();
    let (mut director, entities) =
        conflict_director(&fixture, EngineConfig::default(), &["v1"], &[Some(0)]);
    let err = director
        .before_variable_changed(entities[0], fixture.weight)
        .unwrap_err();
    assert_eq!(
        usage(err),
        UsageError::NotAVariable {
            variable: "Entity.weight".to_string(),
        }
    );
}

#[test]
fn test_problem_fact_cannot_be_removed_as_entity() {
    let fixture = Assignment::new();
    let (mut director, _) =
        conflict_director(&fixture, EngineConfig::default(), &["v1"], &[Some(0)]);
    let slot = fixture.slots(director.working_solution())[0];
    let err = director.before_entity_removed(slot).unwrap_err();
    assert_eq!(
        usage(err),
        UsageError::WrongFactKind {
            fact: slot,
            expected: "planning entity",
            actual: "problem fact",
        }
    );
}

#[test]
fn test_fact_inserted_without_hooks_is_unknown() {
    let fixture = Assignment::new();
    let (mut director, _) = conflict_director(&fixture, EngineConfig::default(), &["v1"], &[]);
    let sneaked = director
        .working_solution_mut()
        .insert(fixture.entity_fact(9, None));
    let err = director
        .before_variable_changed(sneaked, fixture.value)
        .unwrap_err();
    assert_eq!(usage(err), UsageError::FactNotInserted { fact: sneaked });
}

#[test]
fn test_removed_fact_must_leave_the_store() {
    let fixture = Assignment::new();
    let (mut director, entities) =
        conflict_director(&fixture, EngineConfig::default(), &["v1"], &[Some(0)]);
    director.before_entity_removed(entities[0]).unwrap();
    let err = director.after_entity_removed(entities[0]).unwrap_err();
    assert_eq!(usage(err), UsageError::FactStillPresent { fact: entities[0] });
}

#[test]
fn test_repeated_before_removed_hook_rejected() {
    let fixture = Assignment::new();
    let (mut director, entities) = conflict_director(
        &fixture,
        EngineConfig::default(),
        &["v1", "v2"],
        &[Some(0), Some(0)],
    );
    director.before_entity_removed(entities[0]).unwrap();
    let err = director.before_entity_removed(entities[0]).unwrap_err();
    assert_eq!(
        usage(err),
        UsageError::UnpairedHook {
            hook: "before_entity_removed",
            fact: entities[0],
        }
    );
    director.working_solution_mut().store_mut().remove(entities[0]);
    director.after_entity_removed(entities[0]).unwrap();
    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::ZERO);

    let spare = fixture.slots(director.working_solution())[1];
    director.before_problem_fact_removed(spare).unwrap();
    let err = director.before_problem_fact_removed(spare).unwrap_err();
    assert_eq!(
        usage(err),
        UsageError::UnpairedHook {
            hook: "before_problem_fact_removed",
            fact: spare,
        }
    );
    director.working_solution_mut().store_mut().remove(spare);
    director.after_problem_fact_removed(spare).unwrap();
    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::ZERO);
}

#[test]
fn test_entities_added_and_removed_through_hooks() {
    let fixture = Assignment::new();
    let (mut director, entities) =
        conflict_director(&fixture, EngineConfig::default(), &["v1"], &[Some(0)]);
    let v1 = fixture.slots(director.working_solution())[0];
    assert_eq!(director.working_entity_list_revision(), 0);

    let added = director.add_entity(fixture.entity_fact(5, Some(v1))).unwrap();
    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::of(-1));
    assert_eq!(director.working_entity_list_revision(), 1);

    director.remove_entity(entities[0]).unwrap();
    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::ZERO);
    assert_eq!(director.working_entity_list_revision(), 2);

    director.set_all_changes_will_be_undone(true);
    let temporary = director.add_entity(fixture.entity_fact(6, Some(v1))).unwrap();
    director.remove_entity(temporary).unwrap();
    assert_eq!(director.working_entity_list_revision(), 2);
    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::ZERO);
    assert!(director.working_solution().store().contains(added));
}

#[test]
fn test_init_score_tracks_unassigned_variables() {
    let fixture = Assignment::new();
    let (mut director, entities) =
        conflict_director(&fixture, EngineConfig::default(), &["v1"], &[None, None]);
    assert_eq!(director.calculate_score().unwrap().init_score(), -2);

    let v1 = fixture.slots(director.working_solution())[0];
    director
        .change_variable(entities[0], fixture.value, Value::Ref(v1))
        .unwrap();
    assert_eq!(director.calculate_score().unwrap().init_score(), -1);

    director.remove_entity(entities[1]).unwrap();
    let score = director.calculate_score().unwrap();
    assert_eq!(score.init_score(), 0);
    assert!(score.is_solution_initialized());
}

#[test]
fn test_problem_fact_lifecycle_keeps_lookup_current() {
    let fixture = Assignment::new();
    let (mut director, entities) =
        conflict_director(&fixture, EngineConfig::default(), &["v1"], &[Some(0)]);
    let v1 = fixture.slots(director.working_solution())[0];

    let v2 = director.add_problem_fact(fixture.slot_fact("v2")).unwrap();
    assert_eq!(
        director.look_up_working_fact(fixture.slot, &text("v2")).unwrap(),
        Some(v2)
    );

    director
        .change_problem_property(v1, fixture.slot_id, text("renamed"))
        .unwrap();
    assert_eq!(director.look_up_working_fact(fixture.slot, &text("v1")).unwrap(), None);
    assert_eq!(
        director.look_up_working_fact(fixture.slot, &text("renamed")).unwrap(),
        Some(v1)
    );

    director.remove_problem_fact(v2).unwrap();
    assert_eq!(director.look_up_working_fact(fixture.slot, &text("v2")).unwrap(), None);

    let external = fixture.entity_fact(0, None);
    assert_eq!(
        director.look_up_working_object(&external).unwrap(),
        Some(entities[0])
    );
    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::ZERO);
}

#[test]
fn test_lookup_disabled() {
    let fixture = Assignment::new();
    let config = EngineConfig::new().with_look_up_strategy(LookUpStrategyType::None);
    let (director, _) = conflict_director(&fixture, config, &["v1"], &[Some(0)]);
    let err = director
        .look_up_working_object(&fixture.slot_fact("v1"))
        .unwrap_err();
    assert_eq!(usage(err), UsageError::LookUpDisabled);
}

#[test]
fn test_duplicate_planning_id_rejected() {
    let fixture = Assignment::new();
    let factory = conflict_factory(&fixture, EngineConfig::default());
    let (mut solution, _) = fixture.solution::<SimpleScore>(&["v1"], &[]);
    solution.insert(fixture.slot_fact("v1"));
    let err = factory.build_score_director(solution).err().unwrap();
    assert!(matches!(
        err,
        ScoreDirectorError::Configuration(ConfigurationError::DuplicatePlanningId { .. })
    ));
}

#[test]
fn test_missing_planning_id_rejected() {
    let fixture = Assignment::new();
    let factory = conflict_factory(&fixture, EngineConfig::default());
    let mut solution = WorkingSolution::<SimpleScore>::new(fixture.schema.clone());
    solution.insert(Fact::new(&fixture.schema, fixture.slot));
    let err = factory.build_score_director(solution).err().unwrap();
    assert_eq!(
        err.to_string(),
        "class Slot requires a planning id but a fact has none"
    );
}

#[test]
fn test_constraint_match_totals_need_tracking() {
    let fixture = Assignment::new();
    let (director, _) = conflict_director(&fixture, EngineConfig::default(), &["v1"], &[]);
    let err = director.constraint_match_totals().unwrap_err();
    assert_eq!(usage(err), UsageError::ConstraintMatchDisabled);
}

#[test]
fn test_configured_weight_overrides() {
    let fixture = Assignment::new();
    let config = EngineConfig::new()
        .with_constraint_weight("Conflict", "3")
        .with_constraint_match_enabled(true);
    let (mut director, _) = conflict_director(&fixture, config, &["v1"], &[Some(0), Some(0)]);
    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::of(-3));

    let config = EngineConfig::new()
        .with_constraint_weight("Conflict", "0")
        .with_constraint_match_enabled(true);
    let (mut director, _) = conflict_director(&fixture, config, &["v1"], &[Some(0), Some(0)]);
    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::ZERO);
    assert_eq!(director.constraint_match_totals().unwrap()[0].match_count, 0);
}

#[test]
fn test_factory_weight_overrides_by_full_name() {
    let fixture = Assignment::new();
    let value = fixture.value;
    let network = ConstraintFactory::<SimpleScore>::define(fixture.schema.clone(), |factory| {
        factory
            .for_each_unique_pair("Entity", [equal(Mapping::field(0, value))])
            .penalize(SimpleScore::ONE)
            .as_constraint_in("roster", "Conflict");
        factory
            .for_each("Entity")
            .penalize(SimpleScore::ONE)
            .as_constraint("Assigned");
    })
    .unwrap();
    let overrides = ConstraintWeightOverrides::from_pairs([("roster/Conflict", SimpleScore::of(10))])
        .with_weight("Assigned", SimpleScore::ZERO)
        .with_weight("Conflict", SimpleScore::of(99));
    let factory = Arc::new(
        ScoreDirectorFactory::new(network, EngineConfig::new())
            .unwrap()
            .with_weight_overrides(&overrides),
    );
    let weights: Vec<_> = factory
        .network()
        .constraints()
        .iter()
        .map(|c| c.weight())
        .collect();
    assert_eq!(weights, [SimpleScore::of(10), SimpleScore::ZERO]);

    let (solution, _) = fixture.solution(&["v1"], &[Some(0), Some(0), Some(0)]);
    let mut director = factory.build_score_director(solution).unwrap();
    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::of(-30));
}

#[test]
fn test_unparseable_weight_rejected() {
    let fixture = Assignment::new();
    let value = fixture.value;
    let network = ConstraintFactory::<SimpleScore>::define(fixture.schema.clone(), |factory| {
        factory
            .for_each_unique_pair("Entity", [equal(Mapping::field(0, value))])
            .penalize(SimpleScore::ONE)
            .as_constraint("Conflict");
    })
    .unwrap();
    let config = EngineConfig::new().with_constraint_weight("Conflict", "3hard/1soft");
    assert!(matches!(
        ScoreDirectorFactory::new(network, config),
        Err(ScoreDirectorError::Config(_))
    ));
}

/// Copies `input` into `echo`.
struct Echo {
    input: FieldRef,
    echo: FieldRef,
}

impl VariableListener for Echo {
    fn after_variable_changed(
        &mut self,
        writer: &mut dyn ShadowWriter,
        entity: FactId,
    ) -> Result<(), ListenerError> {
        let value = writer.value(entity, self.input).clone();
        writer.set_shadow(entity, self.echo, value)?;
        Ok(())
    }
}

/// Copies `echo` into `shout`, refusing `"boom"`.
struct Shout {
    echo: FieldRef,
    shout: FieldRef,
}

impl VariableListener for Shout {
    fn after_variable_changed(
        &mut self,
        writer: &mut dyn ShadowWriter,
        entity: FactId,
    ) -> Result<(), ListenerError> {
        let value = writer.value(entity, self.echo).clone();
        if value == Value::text("boom") {
            return Err(ListenerError::Failed("refusing to shout boom".to_string()));
        }
        writer.set_shadow(entity, self.shout, value)?;
        Ok(())
    }
}

#[test]
fn test_failing_listener_rolls_back_the_round() {
    let mut builder = SolutionSchema::builder();
    builder
        .class(
            ClassDef::entity("Cell")
                .with_genuine("input")
                .with_shadow("echo")
                .with_shadow("shout"),
        )
        .unwrap();
    let input = builder.field_ref("Cell", "input").unwrap();
    let echo = builder.field_ref("Cell", "echo").unwrap();
    let shout = builder.field_ref("Cell", "shout").unwrap();
    builder
        .listener(
            ListenerDeclaration::new("Echo", move || Box::new(Echo { input, echo }))
                .source(input)
                .target(echo),
        )
        .listener(
            ListenerDeclaration::new("Shout", move || Box::new(Shout { echo, shout }))
                .source(echo)
                .target(shout),
        );
    let schema = builder.build().unwrap();
    let network = ConstraintFactory::<SimpleScore>::define(Arc::clone(&schema), |factory| {
        factory
            .for_each("Cell")
            .filter(move |t| t.field(0, shout).is_none())
            .penalize(SimpleScore::ONE)
            .as_constraint("Silent cell");
    })
    .unwrap();
    let factory = Arc::new(ScoreDirectorFactory::new(network, EngineConfig::default()).unwrap());
    let mut director = factory
        .build_score_director(WorkingSolution::new(Arc::clone(&schema)))
        .unwrap();
    let cell = director
        .add_entity(Fact::new(&schema, schema.class_id("Cell").unwrap()))
        .unwrap();

    director.change_variable(cell, input, text("ok")).unwrap();
    director.trigger_variable_listeners().unwrap();
    assert_eq!(director.working_solution().store().value(cell, shout), &text("ok"));

    director.change_variable(cell, input, text("boom")).unwrap();
    let err = director.trigger_variable_listeners().unwrap_err();
    match err {
        ScoreDirectorError::ListenerFailed {
            listener, entity, ..
        } => {
            assert_eq!(listener, "Shout");
            assert_eq!(entity, cell);
        }
        other => panic!("expected listener failure, got {other}"),
    }
    let store = director.working_solution().store();
    assert_eq!(store.value(cell, echo), &text("ok"));
    assert_eq!(store.value(cell, shout), &text("ok"));
}
