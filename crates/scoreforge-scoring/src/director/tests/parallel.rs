use rayon::prelude::*;
use scoreforge_config::EngineConfig;
use scoreforge_core::{SimpleScore, Value};
use scoreforge_test::Assignment;

use super::conflict_factory;
use crate::director::ScoreDirector;
use crate::moves::ChangeMove;

#[test]
fn test_directors_from_one_factory_run_in_parallel() {
    let fixture = Assignment::new();
    let factory = conflict_factory(&fixture, EngineConfig::default());
    let (solution, entities) =
        fixture.solution::<SimpleScore>(&["v1", "v2", "v3"], &[Some(0), Some(0), Some(0), Some(1)]);
    let slots = fixture.slots(&solution);

    let candidates: Vec<(usize, usize)> = (0..entities.len())
        .flat_map(|e| (0..slots.len()).map(move |s| (e, s)))
        .collect();

    let evaluate = |&(e, s): &(usize, usize)| {
        let mut director = factory.build_score_director(solution.clone()).unwrap();
        let change = ChangeMove::new(entities[e], fixture.value, Value::Ref(slots[s]));
        director.evaluate_move(&change).unwrap().score()
    };
    let parallel: Vec<SimpleScore> = candidates.par_iter().map(evaluate).collect();
    let sequential: Vec<SimpleScore> = candidates.iter().map(evaluate).collect();
    assert_eq!(parallel, sequential);

    // Moving entity 0 from v1 to v3 leaves one of the three conflicts.
    let index = candidates.iter().position(|&c| c == (0, 2)).unwrap();
    assert_eq!(parallel[index], SimpleScore::of(-1));

    // The shared solution was never touched.
    let mut director = factory.build_score_director(solution).unwrap();
    assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::of(-3));
}
