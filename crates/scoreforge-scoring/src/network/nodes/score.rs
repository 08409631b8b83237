use std::collections::HashMap;

use scoreforge_core::domain::FactStore;
use scoreforge_core::Score;

use super::{view, Change, TupleKey, Tuples};
use crate::inliner::ScoreInliner;
use crate::network::definition::{ConstraintDefinition, MatchWeigher};

/// Impact of every live match of one constraint.
pub(crate) struct ScoreState<Sc: Score> {
    impacts: HashMap<TupleKey, Sc>,
}

impl<Sc: Score> Default for ScoreState<Sc> {
    fn default() -> Self {
        Self {
            impacts: HashMap::new(),
        }
    }
}

impl<Sc: Score> ScoreState<Sc> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn apply(
        &mut self,
        tuples: &Tuples,
        store: &FactStore,
        index: usize,
        constraint: &ConstraintDefinition<Sc>,
        weigher: &MatchWeigher,
        inliner: &mut ScoreInliner<Sc>,
        change: Change,
    ) {
        let weight = constraint.signed_weight();
        // disabled by a zero weight override
        if weight.is_zero() {
            return;
        }
        match change {
            Change::Insert(tuple) | Change::Update(tuple) => {
                let impact = weigher.weigh(weight, &view(tuples, store, tuple));
                self.put(tuples, index, inliner, tuple, impact);
            }
            Change::Retract(tuple) => {
                if let Some(impact) = self.impacts.remove(&tuple) {
                    inliner.remove(index, tuple, impact);
                }
            }
        }
    }

    fn put(
        &mut self,
        tuples: &Tuples,
        index: usize,
        inliner: &mut ScoreInliner<Sc>,
        tuple: TupleKey,
        impact: Sc,
    ) {
        let justification = || {
            tuples
                .get(tuple)
                .map(|record| record.items.to_vec())
                .unwrap_or_default()
        };
        match self.impacts.insert(tuple, impact) {
            Some(old) => inliner.replace(index, tuple, old, impact, justification),
            None => inliner.add(index, tuple, impact, justification),
        }
    }
}
