use std::sync::Arc;

use rust_decimal::Decimal;
use scoreforge_core::{ConfigurationError, SimpleDecimalScore, SimpleScore};
use scoreforge_test::{Assignment, Schedule};

use super::joiner::{equal, equal_on, filtering};
use super::{ConstraintFactory, Mapping, Predicate};
use crate::network::TupleNetwork;

#[test]
fn test_filtering_joiner_before_indexing_fails_define() {
    let fixture = Assignment::new();
    let value = fixture.value;
    let result = ConstraintFactory::<SimpleScore>::define(fixture.schema.clone(), |factory| {
        factory
            .for_each_unique_pair(
                "Entity",
                [filtering(|_, _| true), equal(Mapping::field(0, value))],
            )
            .penalize(SimpleScore::ONE)
            .as_constraint("Conflict");
    });
    // position 0 holds the implicit ordering joiner of the pair
    assert_eq!(
        result.unwrap_err(),
        ConfigurationError::JoinerOrder {
            filtering: 1,
            indexing: 2
        }
    );
}

#[test]
fn test_unknown_class_fails_define() {
    let fixture = Assignment::new();
    let result = ConstraintFactory::<SimpleScore>::define(fixture.schema.clone(), |factory| {
        factory
            .for_each("Room")
            .filter(|_| true)
            .penalize(SimpleScore::ONE)
            .as_constraint("Rooms");
    });
    assert!(matches!(
        result.unwrap_err(),
        ConfigurationError::UnknownClass { class } if class == "Room"
    ));
}

#[test]
fn test_duplicate_constraint_name() {
    let fixture = Assignment::new();
    let result = ConstraintFactory::<SimpleScore>::define(fixture.schema.clone(), |factory| {
        factory
            .for_each("Entity")
            .penalize(SimpleScore::ONE)
            .as_constraint("Twice");
        factory
            .for_each("Slot")
            .reward(SimpleScore::ONE)
            .as_constraint("Twice");
    });
    assert!(matches!(
        result.unwrap_err(),
        ConfigurationError::DuplicateConstraint { name } if name == "Twice"
    ));
}

#[test]
fn test_dropped_builder_is_unterminated() {
    let fixture = Assignment::new();
    let result = ConstraintFactory::<SimpleScore>::define(fixture.schema.clone(), |factory| {
        let _ = factory.for_each("Entity").penalize(SimpleScore::ONE);
    });
    assert_eq!(result.unwrap_err(), ConfigurationError::UnterminatedStream);
}

#[test]
fn test_packages_prefix_constraint_names() {
    let fixture = Assignment::new();
    let factory = ConstraintFactory::<SimpleScore>::new(fixture.schema.clone()).with_package("assign");
    factory
        .for_each("Entity")
        .penalize(SimpleScore::ONE)
        .as_constraint("Counted");
    factory
        .for_each("Slot")
        .reward(SimpleScore::ONE)
        .as_constraint_in("slots", "Offered");
    let network = factory.build().unwrap();

    let names: Vec<String> = network
        .constraints()
        .iter()
        .map(|c| c.constraint_ref().full_name())
        .collect();
    assert_eq!(names, ["assign/Counted", "slots/Offered"]);
}

#[test]
fn test_shared_predicate_shares_filter_node() {
    let fixture = Assignment::new();
    let weight = fixture.weight;
    let heavy = Predicate::new(move |tuple| tuple.field(0, weight).as_int() > Some(0));

    let shared = ConstraintFactory::<SimpleScore>::define(fixture.schema.clone(), |factory| {
        factory
            .for_each("Entity")
            .filter_with(&heavy)
            .penalize(SimpleScore::ONE)
            .as_constraint("Heavy");
        factory
            .for_each("Entity")
            .filter_with(&heavy)
            .reward(SimpleScore::ONE)
            .as_constraint("Heavy reward");
    })
    .unwrap();
    let separate = ConstraintFactory::<SimpleScore>::define(fixture.schema.clone(), |factory| {
        factory
            .for_each("Entity")
            .filter(move |tuple| tuple.field(0, weight).as_int() > Some(0))
            .penalize(SimpleScore::ONE)
            .as_constraint("Heavy");
        factory
            .for_each("Entity")
            .filter(move |tuple| tuple.field(0, weight).as_int() > Some(0))
            .reward(SimpleScore::ONE)
            .as_constraint("Heavy reward");
    })
    .unwrap();

    assert_eq!(separate.nodes().len(), shared.nodes().len() + 1);
    assert!(shared.shared_node_count() > separate.shared_node_count());
}

#[test]
fn test_if_exists_other_excludes_self() {
    let fixture = Assignment::new();
    let value = fixture.value;
    let network = ConstraintFactory::<SimpleScore>::define(fixture.schema.clone(), |factory| {
        factory
            .for_each("Entity")
            .if_exists_other("Entity", [equal(Mapping::field(0, value))])
            .penalize(SimpleScore::ONE)
            .as_constraint("Crowded");
    })
    .unwrap();
    let (solution, _) = fixture.solution::<SimpleScore>(&["v1", "v2"], &[Some(0), Some(0), Some(1)]);
    let network = TupleNetwork::from_store(Arc::new(network), solution.store(), false);
    assert_eq!(network.score(), SimpleScore::of(-2));
}

#[test]
fn test_join_by_reference() {
    let fixture = Schedule::new();
    let assignee = fixture.assignee;
    let network = ConstraintFactory::<SimpleScore>::define(fixture.schema.clone(), |factory| {
        factory
            .for_each("Shift")
            .join("Employee", [equal_on(Mapping::field(0, assignee), Mapping::item(0))])
            .reward(SimpleScore::ONE)
            .as_constraint("Staffed");
    })
    .unwrap();

    let mut solution = fixture.empty::<SimpleScore>();
    let ann = solution.insert(fixture.employee("Ann"));
    let bob = solution.insert(fixture.employee("Bob"));
    solution.insert(fixture.shift(1, 0, 8, Some(ann)));
    solution.insert(fixture.shift(2, 8, 16, Some(bob)));
    solution.insert(fixture.shift(3, 16, 24, None));
    let network = TupleNetwork::from_store(Arc::new(network), solution.store(), false);
    assert_eq!(network.score(), SimpleScore::of(2));
}

#[test]
fn test_join_stream_with_filtered_right_side() {
    let fixture = Schedule::new();
    let (assignee, start, end) = (fixture.assignee, fixture.start, fixture.end);
    let (owner, time) = (fixture.unavailable_employee, fixture.unavailable_time);
    let network = ConstraintFactory::<SimpleScore>::define(fixture.schema.clone(), |factory| {
        let absences = factory
            .for_each("Unavailable")
            .filter(move |tuple| tuple.field(0, time).as_int() >= Some(0));
        factory
            .for_each("Shift")
            .join_stream(absences, [equal_on(Mapping::field(0, assignee), Mapping::field(0, owner))])
            .filter(move |tuple| {
                let at = tuple.field(1, time);
                tuple.field(0, start) <= at && at < tuple.field(0, end)
            })
            .penalize(SimpleScore::ONE)
            .as_constraint("Unavailable employee");
    })
    .unwrap();

    let mut solution = fixture.empty::<SimpleScore>();
    let ann = solution.insert(fixture.employee("Ann"));
    solution.insert(fixture.shift(1, 0, 8, Some(ann)));
    solution.insert(fixture.shift(2, 8, 16, Some(ann)));
    solution.insert(fixture.unavailable(ann, 4));
    solution.insert(fixture.unavailable(ann, 20));
    solution.insert(fixture.unavailable(ann, -1));
    let network = TupleNetwork::from_store(Arc::new(network), solution.store(), false);
    assert_eq!(network.score(), SimpleScore::of(-1));
}

#[test]
fn test_reward_decimal_match_weight() {
    let fixture = Schedule::new();
    let (start, end) = (fixture.start, fixture.end);
    let network = ConstraintFactory::<SimpleDecimalScore>::define(fixture.schema.clone(), |factory| {
        factory
            .for_each_including_unassigned("Shift")
            .reward_decimal(SimpleDecimalScore::ONE, move |tuple| {
                let hours = tuple.field(0, end).as_int().unwrap_or(0)
                    - tuple.field(0, start).as_int().unwrap_or(0);
                Decimal::from(hours) / Decimal::from(2)
            })
            .as_constraint("Half hours");
    })
    .unwrap();

    let mut solution = fixture.empty::<SimpleDecimalScore>();
    solution.insert(fixture.shift(1, 0, 8, None));
    solution.insert(fixture.shift(2, 8, 11, None));
    let network = TupleNetwork::from_store(Arc::new(network), solution.store(), false);
    assert_eq!(network.score(), SimpleDecimalScore::of(Decimal::new(55, 1)));
}
