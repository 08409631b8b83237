//! Running score totals maintained by the scoring nodes.

use std::collections::HashMap;

use scoreforge_core::{ConstraintRef, Score, SolutionScore, Value};

use crate::api::analysis::{ConstraintMatch, ConstraintMatchTotal};
use crate::network::ConstraintDefinition;
use crate::network::nodes::TupleKey;

struct ConstraintTotal<Sc: Score> {
    constraint_ref: ConstraintRef,
    weight: Sc,
    score: Sc,
    match_count: usize,
    /// Present only when match tracking is enabled.
    matches: Option<HashMap<TupleKey, ConstraintMatch<Sc>>>,
}

/// Accumulates the impact of every live match.
///
/// The total score is the sum of the per-constraint totals at all times;
/// each impact added is later removed with exactly the same value.
pub struct ScoreInliner<Sc: Score> {
    score: Sc,
    constraints: Vec<ConstraintTotal<Sc>>,
    constraint_match_enabled: bool,
}

impl<Sc: Score> ScoreInliner<Sc> {
    pub(crate) fn new(constraints: &[ConstraintDefinition<Sc>], constraint_match_enabled: bool) -> Self {
        Self {
            score: Sc::zero(),
            constraints: constraints
                .iter()
                .map(|c| ConstraintTotal {
                    constraint_ref: c.constraint_ref().clone(),
                    weight: c.signed_weight(),
                    score: Sc::zero(),
                    match_count: 0,
                    matches: constraint_match_enabled.then(HashMap::new),
                })
                .collect(),
            constraint_match_enabled,
        }
    }

    pub(crate) fn add<F>(&mut self, constraint: usize, tuple: TupleKey, impact: Sc, justification: F)
    where
        F: FnOnce() -> Vec<Value>,
    {
        let Some(total) = self.constraints.get_mut(constraint) else {
            return;
        };
        self.score = self.score + impact;
        total.score = total.score + impact;
        total.match_count += 1;
        if let Some(matches) = &mut total.matches {
            matches.insert(
                tuple,
                ConstraintMatch::new(total.constraint_ref.clone(), justification(), impact),
            );
        }
    }

    pub(crate) fn replace<F>(&mut self, constraint: usize, tuple: TupleKey, old: Sc, new: Sc, justification: F)
    where
        F: FnOnce() -> Vec<Value>,
    {
        let Some(total) = self.constraints.get_mut(constraint) else {
            return;
        };
        self.score = self.score - old + new;
        total.score = total.score - old + new;
        if let Some(matches) = &mut total.matches {
            matches.insert(
                tuple,
                ConstraintMatch::new(total.constraint_ref.clone(), justification(), new),
            );
        }
    }

    pub(crate) fn remove(&mut self, constraint: usize, tuple: TupleKey, impact: Sc) {
        let Some(total) = self.constraints.get_mut(constraint) else {
            return;
        };
        self.score = self.score - impact;
        total.score = total.score - impact;
        total.match_count = total.match_count.saturating_sub(1);
        if let Some(matches) = &mut total.matches {
            matches.remove(&tuple);
        }
    }

    /// Sum of all live match impacts.
    pub fn score(&self) -> Sc {
        self.score
    }

    pub fn extract_score(&self, init_score: i64) -> SolutionScore<Sc> {
        SolutionScore::uninitialized(init_score, self.score)
    }

    pub fn is_constraint_match_enabled(&self) -> bool {
        self.constraint_match_enabled
    }

    /// Score of one constraint, by full name.
    pub fn constraint_score(&self, full_name: &str) -> Option<Sc> {
        self.constraints
            .iter()
            .find(|t| t.constraint_ref.full_name() == full_name)
            .map(|t| t.score)
    }

    /// Per-constraint totals in definition order.
    ///
    /// Matches are listed only when tracking is enabled, sorted by
    /// justification so two networks over equal facts compare equal.
    pub fn constraint_match_totals(&self) -> Vec<ConstraintMatchTotal<Sc>> {
        self.constraints
            .iter()
            .map(|total| {
                let mut matches: Vec<ConstraintMatch<Sc>> = total
                    .matches
                    .as_ref()
                    .map(|m| m.values().cloned().collect())
                    .unwrap_or_default();
                matches.sort_by(|a, b| {
                    a.justification
                        .cmp(&b.justification)
                        .then_with(|| a.score.cmp(&b.score))
                });
                ConstraintMatchTotal {
                    constraint_ref: total.constraint_ref.clone(),
                    weight: total.weight,
                    score: total.score,
                    match_count: total.match_count,
                    matches,
                }
            })
            .collect()
    }
}
