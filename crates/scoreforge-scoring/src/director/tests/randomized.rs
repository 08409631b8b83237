use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use scoreforge_config::{EngineConfig, EnvironmentMode};
use scoreforge_core::{Fact, FactId, HardSoftScore, Value};
use scoreforge_test::{Assignment, Schedule};

use crate::api::analysis::ConstraintMatchDiff;
use crate::director::{IncrementalScoreDirector, ScoreDirector, ScoreDirectorFactory};
use crate::network::{TupleNetwork, TupleView};
use crate::stream::collector::{count, max, sum};
use crate::stream::joiner::{equal, equal_on, filtering, greater_than, less_than, less_than_or_equal};
use crate::stream::{ConstraintFactory, Mapping};

fn factory(fixture: &Assignment, mode: EnvironmentMode) -> Arc<ScoreDirectorFactory<HardSoftScore>> {
    let value = fixture.value;
    let network = ConstraintFactory::define(fixture.schema.clone(), |factory| {
        factory
            .for_each_unique_pair("Entity", [equal(Mapping::field(0, value))])
            .penalize(HardSoftScore::of(1, 0))
            .as_constraint("Conflict");
        factory
            .for_each("Entity")
            .group_by_collect(Mapping::field(0, value), count())
            .penalize_with(HardSoftScore::of(0, 1), |group| {
                let n = group.get(1).as_int().unwrap_or(0);
                n * n
            })
            .as_constraint("Load");
        factory
            .for_each("Slot")
            .if_not_exists("Entity", [equal_on(Mapping::item(0), Mapping::field(0, value))])
            .penalize(HardSoftScore::of(0, 5))
            .as_constraint("Idle slot");
    })
    .unwrap();
    let config = EngineConfig::new().with_environment_mode(mode);
    Arc::new(ScoreDirectorFactory::new(network, config).unwrap())
}

/// Applies random changes, additions and removals and compares every
/// score with a network rebuilt from the final facts.
fn run(seed: u64, mode: EnvironmentMode, steps: usize) {
    let fixture = Assignment::new();
    let factory = factory(&fixture, mode);
    let assignments: Vec<Option<usize>> = (0..6).map(|i| Some(i % 3)).collect();
    let (solution, mut entities) = fixture.solution(&["a", "b", "c"], &assignments);
    let slots = fixture.slots(&solution);
    let mut director = factory.build_score_director(solution).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut next_id = 100;

    for _ in 0..steps {
        let roll = rng.random_range(0..10);
        if roll < 7 && !entities.is_empty() {
            let entity = entities[rng.random_range(0..entities.len())];
            let value = match rng.random_range(0..=slots.len()) {
                i if i == slots.len() => Value::None,
                i => Value::Ref(slots[i]),
            };
            director.change_variable(entity, fixture.value, value).unwrap();
        } else if roll < 9 {
            let slot = slots[rng.random_range(0..slots.len())];
            let fact = fixture.entity_fact(next_id, Some(slot));
            next_id += 1;
            entities.push(director.add_entity(fact).unwrap());
        } else if !entities.is_empty() {
            let entity: FactId = entities.swap_remove(rng.random_range(0..entities.len()));
            director.remove_entity(entity).unwrap();
        }

        if rng.random_bool(0.5) {
            let score = director.calculate_score().unwrap();
            let solution = director.working_solution();
            let scratch = TupleNetwork::from_store(
                Arc::clone(factory.network()),
                solution.store(),
                false,
            );
            assert_eq!(score.score(), scratch.score());
            assert_eq!(score.init_score(), solution.init_score());
        }
    }
}

#[test]
fn test_random_changes_match_scratch() {
    for seed in 0..8 {
        run(seed, EnvironmentMode::Reproducible, 200);
    }
}

#[test]
fn test_random_changes_under_full_assert() {
    run(42, EnvironmentMode::FullAssert, 100);
}

fn hours(tuple: &TupleView<'_>, item: usize, fixture: &Schedule) -> i64 {
    let start = tuple.field(item, fixture.start).as_int().unwrap_or(0);
    let end = tuple.field(item, fixture.end).as_int().unwrap_or(0);
    end - start
}

fn schedule_factory(fixture: &Schedule, mode: EnvironmentMode) -> Arc<ScoreDirectorFactory<HardSoftScore>> {
    let (assignee, start, end) = (fixture.assignee, fixture.start, fixture.end);
    let (owner, time, name) = (
        fixture.unavailable_employee,
        fixture.unavailable_time,
        fixture.employee_name,
    );
    let network = ConstraintFactory::define(fixture.schema.clone(), |factory| {
        factory
            .for_each_unique_pair(
                "Shift",
                [
                    equal(Mapping::field(0, assignee)),
                    less_than(Mapping::field(0, start), Mapping::field(0, end)),
                    greater_than(Mapping::field(0, end), Mapping::field(0, start)),
                    filtering(move |left, _| !left.field(0, assignee).is_none()),
                ],
            )
            .penalize_with(HardSoftScore::of(1, 0), move |pair| {
                let ends = pair.field(0, end).min(pair.field(1, end));
                let starts = pair.field(0, start).max(pair.field(1, start));
                ends.as_int().unwrap_or(0) - starts.as_int().unwrap_or(0)
            })
            .as_constraint("Overlapping shifts");

        let shift_hours = fixture.clone();
        factory
            .for_each("Shift")
            .if_exists(
                "Unavailable",
                [
                    equal_on(Mapping::field(0, assignee), Mapping::field(0, owner)),
                    less_than_or_equal(Mapping::field(0, start), Mapping::field(0, time)),
                    greater_than(Mapping::field(0, end), Mapping::field(0, time)),
                ],
            )
            .penalize_with(HardSoftScore::of(1, 0), move |shift| hours(shift, 0, &shift_hours))
            .as_constraint("Unavailable employee");

        factory
            .for_each("Shift")
            .filter(move |shift| !shift.field(0, assignee).is_none())
            .if_not_exists_other(
                "Shift",
                [
                    equal(Mapping::field(0, assignee)),
                    greater_than(Mapping::field(0, start), Mapping::field(0, start)),
                ],
            )
            .reward(HardSoftScore::of(0, 1))
            .as_constraint("First shift");

        let load_hours = fixture.clone();
        factory
            .for_each("Shift")
            .join_stream(
                factory.for_each("Employee"),
                [equal_on(Mapping::field(0, assignee), Mapping::item(0))],
            )
            .group_by_collectors(
                Some(Mapping::field(1, name)),
                vec![
                    count(),
                    sum(Mapping::custom(move |t| Value::Int(hours(t, 0, &load_hours)))),
                    max(Mapping::field(0, end)),
                ],
            )
            .filter(|load| load.get(2).as_int().unwrap_or(0) > 8)
            .penalize_with(HardSoftScore::of(0, 1), |load| {
                let worked = load.get(2).as_int().unwrap_or(0);
                let latest = load.get(3).as_int().unwrap_or(0);
                (worked - 8) * load.get(1).as_int().unwrap_or(0) + latest / 8
            })
            .as_constraint("Overtime");

        factory
            .for_each_including_unassigned("Shift")
            .group_by_collectors(None, vec![count(), sum(Mapping::field(0, start))])
            .penalize_with(HardSoftScore::of(0, 1), |all| {
                all.get(0).as_int().unwrap_or(0) + all.get(1).as_int().unwrap_or(0) % 7
            })
            .as_constraint("Roster size");

        factory
            .for_each("Unavailable")
            .if_not_exists("Employee", [equal_on(Mapping::field(0, owner), Mapping::item(0))])
            .penalize(HardSoftScore::of(0, 3))
            .as_constraint("Orphan absence");
    })
    .unwrap();
    let config = EngineConfig::new()
        .with_environment_mode(mode)
        .with_constraint_match_enabled(true);
    Arc::new(ScoreDirectorFactory::new(network, config).unwrap())
}

/// Live facts of the schedule, kept in step with the director.
struct Roster {
    employees: Vec<FactId>,
    shifts: Vec<FactId>,
    absences: Vec<FactId>,
    next: i64,
}

impl Roster {
    fn pick(rng: &mut ChaCha8Rng, ids: &[FactId]) -> Option<FactId> {
        (!ids.is_empty()).then(|| ids[rng.random_range(0..ids.len())])
    }

    fn employee_or_none(&self, rng: &mut ChaCha8Rng) -> Value {
        match Self::pick(rng, &self.employees) {
            Some(id) if rng.random_bool(0.85) => Value::Ref(id),
            _ => Value::None,
        }
    }

    fn new_shift(&mut self, fixture: &Schedule, rng: &mut ChaCha8Rng) -> Fact {
        self.next += 1;
        let start = rng.random_range(0..24);
        let employee = self.employee_or_none(rng).as_ref_id();
        fixture.shift(self.next, start, start + rng.random_range(1..=8), employee)
    }
}

/// One random change, always bracketed by the director's hooks.
fn mutate(
    director: &mut IncrementalScoreDirector<HardSoftScore>,
    fixture: &Schedule,
    roster: &mut Roster,
    rng: &mut ChaCha8Rng,
) {
    match rng.random_range(0..12) {
        0..=3 => {
            if let Some(shift) = Roster::pick(rng, &roster.shifts) {
                let value = roster.employee_or_none(rng);
                director.change_variable(shift, fixture.assignee, value).unwrap();
            }
        }
        4 => {
            let fact = roster.new_shift(fixture, rng);
            roster.shifts.push(director.add_entity(fact).unwrap());
        }
        5 => {
            if !roster.shifts.is_empty() {
                let shift = roster.shifts.swap_remove(rng.random_range(0..roster.shifts.len()));
                director.remove_entity(shift).unwrap();
            }
        }
        6 => {
            if let Some(absence) = Roster::pick(rng, &roster.absences) {
                let time = Value::Int(rng.random_range(0..32));
                director
                    .change_problem_property(absence, fixture.unavailable_time, time)
                    .unwrap();
            }
        }
        7 => {
            if let Some(absence) = Roster::pick(rng, &roster.absences) {
                let owner = roster.employee_or_none(rng);
                director
                    .change_problem_property(absence, fixture.unavailable_employee, owner)
                    .unwrap();
            }
        }
        8 => {
            if let Some(employee) = Roster::pick(rng, &roster.employees) {
                let fact = fixture.unavailable(employee, rng.random_range(0..32));
                roster.absences.push(director.add_problem_fact(fact).unwrap());
            }
        }
        9 => {
            if !roster.absences.is_empty() {
                let absence = roster.absences.swap_remove(rng.random_range(0..roster.absences.len()));
                director.remove_problem_fact(absence).unwrap();
            }
        }
        10 => {
            if let Some(employee) = Roster::pick(rng, &roster.employees) {
                roster.next += 1;
                let name = Value::text(format!("E{}", roster.next));
                director
                    .change_problem_property(employee, fixture.employee_name, name)
                    .unwrap();
            }
        }
        _ => {
            if roster.employees.len() > 1 && rng.random_bool(0.5) {
                // Shifts are released first; absences keep the dangling reference.
                let employee = roster
                    .employees
                    .swap_remove(rng.random_range(0..roster.employees.len()));
                for &shift in &roster.shifts {
                    let store = director.working_solution().store();
                    if store.value(shift, fixture.assignee).as_ref_id() == Some(employee) {
                        director.change_variable(shift, fixture.assignee, Value::None).unwrap();
                    }
                }
                director.remove_problem_fact(employee).unwrap();
            } else {
                roster.next += 1;
                let fact = fixture.employee(&format!("E{}", roster.next));
                roster.employees.push(director.add_problem_fact(fact).unwrap());
            }
        }
    }
}

/// Applies batches of random changes to a schedule and compares the score
/// and every constraint match with a network rebuilt from the current facts.
fn run_schedule(seed: u64, mode: EnvironmentMode, steps: usize) {
    let fixture = Schedule::new();
    let factory = schedule_factory(&fixture, mode);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut solution = fixture.empty::<HardSoftScore>();
    let mut roster = Roster {
        employees: Vec::new(),
        shifts: Vec::new(),
        absences: Vec::new(),
        next: 0,
    };
    for _ in 0..3 {
        roster.next += 1;
        roster
            .employees
            .push(solution.insert(fixture.employee(&format!("E{}", roster.next))));
    }
    for _ in 0..8 {
        let fact = roster.new_shift(&fixture, &mut rng);
        roster.shifts.push(solution.insert(fact));
    }
    for &employee in &roster.employees {
        let fact = fixture.unavailable(employee, rng.random_range(0..32));
        roster.absences.push(solution.insert(fact));
    }
    let mut director = factory.build_score_director(solution).unwrap();

    for _ in 0..steps {
        for _ in 0..rng.random_range(1..=4) {
            mutate(&mut director, &fixture, &mut roster, &mut rng);
        }

        let score = director.calculate_score().unwrap();
        let working = director.constraint_match_totals().unwrap();
        let scratch = TupleNetwork::from_store(
            Arc::clone(factory.network()),
            director.working_solution().store(),
            true,
        );
        assert_eq!(score.score(), scratch.score(), "seed {seed}");

        let fresh = scratch.constraint_match_totals();
        assert_eq!(working.len(), fresh.len());
        for (w, f) in working.iter().zip(&fresh) {
            assert_eq!(w.constraint_ref, f.constraint_ref);
            assert_eq!((w.score, w.match_count), (f.score, f.match_count), "seed {seed}: {}", w.name());
        }
        let diff = ConstraintMatchDiff::between(&working, &fresh);
        assert!(diff.is_empty(), "seed {seed}: {diff:?}");
    }
}

#[test]
fn test_random_schedule_matches_scratch() {
    for seed in 0..6 {
        run_schedule(seed, EnvironmentMode::Reproducible, 200);
    }
}

#[test]
fn test_random_schedule_under_full_assert() {
    run_schedule(7, EnvironmentMode::FullAssert, 60);
}
