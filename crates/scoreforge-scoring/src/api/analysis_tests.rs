use scoreforge_core::{ConstraintRef, FactId, HardSoftScore, SimpleScore, SolutionScore, Value};
use scoreforge_test::Assignment;

use super::analysis::*;

fn entities(count: usize) -> Vec<FactId> {
    let fixture = Assignment::new();
    let assignments = vec![None; count];
    fixture.solution::<SimpleScore>(&[], &assignments).1
}

fn conflict(a: FactId, b: FactId) -> ConstraintMatch<SimpleScore> {
    ConstraintMatch::new(
        ConstraintRef::new("", "Conflict"),
        vec![Value::Ref(a), Value::Ref(b)],
        SimpleScore::of(-1),
    )
}

fn total(name: &str, matches: Vec<ConstraintMatch<SimpleScore>>) -> ConstraintMatchTotal<SimpleScore> {
    ConstraintMatchTotal {
        constraint_ref: ConstraintRef::new("", name),
        weight: SimpleScore::ONE,
        score: matches.iter().fold(SimpleScore::of(0), |acc, m| acc + m.score),
        match_count: matches.len(),
        matches,
    }
}

#[test]
fn test_indicted_facts_walk_lists_once() {
    let ids = entities(3);
    let m = ConstraintMatch::new(
        ConstraintRef::new("", "Grouped"),
        vec![
            Value::text("G"),
            Value::list([Value::Ref(ids[0]), Value::Ref(ids[1]), Value::Ref(ids[0])]),
            Value::Ref(ids[2]),
        ],
        SimpleScore::of(-3),
    );
    assert_eq!(m.indicted_facts(), vec![ids[0], ids[1], ids[2]]);
    assert!(m.to_string().starts_with("Grouped [G, ["));
    assert!(m.to_string().ends_with("= -3"));
}

#[test]
fn test_explanation_totals() {
    let ids = entities(3);
    let explanation = ScoreExplanation::new(
        SolutionScore::of(SimpleScore::of(-2)),
        vec![
            total("Conflict", vec![conflict(ids[0], ids[1]), conflict(ids[1], ids[2])]),
            total("Idle", Vec::new()),
        ],
    );
    assert_eq!(explanation.total_match_count(), 2);
    assert_eq!(explanation.all_matches().len(), 2);
    assert_eq!(explanation.non_zero_constraints().len(), 1);
    assert_eq!(explanation.total("Idle").map(|t| t.match_count), Some(0));
    assert!(explanation.total("Missing").is_none());
    assert!(explanation.to_string().contains("Conflict: -2 (2 matches)"));
}

#[test]
fn test_worst_facts_first() {
    let ids = entities(3);
    let matches = [conflict(ids[0], ids[1]), conflict(ids[1], ids[2])];
    let map = IndictmentMap::from_matches(&matches);

    assert_eq!(map.len(), 3);
    assert_eq!(map.worst_facts()[0], ids[1]);
    let middle = map.get(ids[1]).unwrap();
    assert_eq!(middle.score, SimpleScore::of(-2));
    assert_eq!(middle.match_count(), 2);
    assert_eq!(middle.constraint_count(), 1);
    assert_eq!(middle.violated_constraints()[0].name, "Conflict");
}

#[test]
fn test_diff_counts_duplicates() {
    let ids = entities(3);
    let working = [total(
        "Conflict",
        vec![conflict(ids[0], ids[1]), conflict(ids[0], ids[1])],
    )];
    let scratch = [total(
        "Conflict",
        vec![conflict(ids[0], ids[1]), conflict(ids[1], ids[2])],
    )];

    let diff = ConstraintMatchDiff::between(&working, &scratch);
    assert_eq!(diff.excess, vec![conflict(ids[0], ids[1]).to_string()]);
    assert_eq!(diff.missing, vec![conflict(ids[1], ids[2]).to_string()]);
    assert!(ConstraintMatchDiff::between(&scratch, &scratch).is_empty());
}

#[test]
fn test_hard_constraints_detected_from_weight() {
    let hard = ConstraintMatchTotal {
        constraint_ref: ConstraintRef::new("", "Overlap"),
        weight: HardSoftScore::ONE_HARD,
        score: HardSoftScore::ZERO,
        match_count: 0,
        matches: Vec::new(),
    };
    let soft = ConstraintMatchTotal {
        weight: HardSoftScore::ONE_SOFT,
        ..hard.clone()
    };
    assert!(hard.is_hard());
    assert!(!soft.is_hard());
    assert!(!total("Simple", Vec::new()).is_hard());
}
