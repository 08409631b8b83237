use std::collections::HashMap;

use scoreforge_core::domain::FactStore;

use super::join::{accepts, keys};
use super::{create, items_of, refresh, Change, Changes, TupleKey, Tuples};
use crate::network::definition::{ExistenceMode, InputSide, NodeId};
use crate::network::index::BetaMemory;
use crate::stream::joiner::JoinerSet;

/// Left tuples passed through while their partner count satisfies the mode.
pub(crate) struct ExistsState {
    memory: BetaMemory,
    /// left tuple -> propagated child
    outputs: HashMap<TupleKey, TupleKey>,
}

impl ExistsState {
    pub(crate) fn new(memory: BetaMemory) -> Self {
        Self {
            memory,
            outputs: HashMap::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn apply(
        &mut self,
        tuples: &mut Tuples,
        store: &FactStore,
        node: NodeId,
        joiners: &JoinerSet,
        mode: ExistenceMode,
        side: InputSide,
        change: Change,
    ) -> Changes {
        let mut changes = Changes::new();
        let orient = |tuple: TupleKey, other: TupleKey| match side {
            InputSide::Left => (tuple, other),
            InputSide::Right => (other, tuple),
        };
        match (side, change) {
            (InputSide::Left, Change::Retract(tuple)) => {
                self.memory.retract(side, tuple);
                if let Some(child) = self.outputs.remove(&tuple) {
                    changes.push(Change::Retract(child));
                }
            }
            (InputSide::Right, Change::Retract(tuple)) => {
                for left in self.memory.retract(side, tuple) {
                    self.sync(tuples, node, mode, left, &mut changes);
                }
            }
            (_, Change::Insert(tuple)) => {
                let (eq, range) = keys(tuples, store, joiners, side, tuple);
                let partners = {
                    let snapshot: &Tuples = tuples;
                    self.memory.insert(side, tuple, eq, range, |other| {
                        accepts(snapshot, store, joiners, orient(tuple, other))
                    })
                };
                match side {
                    InputSide::Left => self.sync(tuples, node, mode, tuple, &mut changes),
                    InputSide::Right => {
                        for left in partners {
                            self.sync(tuples, node, mode, left, &mut changes);
                        }
                    }
                }
            }
            (_, Change::Update(tuple)) => {
                let (eq, range) = keys(tuples, store, joiners, side, tuple);
                let diff = {
                    let snapshot: &Tuples = tuples;
                    self.memory.update(side, tuple, eq, range, |other| {
                        accepts(snapshot, store, joiners, orient(tuple, other))
                    })
                };
                match side {
                    InputSide::Left => {
                        let live = mode.is_live(self.memory.left_partner_count(tuple));
                        match self.outputs.get(&tuple).copied() {
                            Some(child) if live => {
                                refresh(tuples, tuple, child);
                                changes.push(Change::Update(child));
                            }
                            _ => self.sync(tuples, node, mode, tuple, &mut changes),
                        }
                    }
                    InputSide::Right => {
                        for left in diff.removed.into_iter().chain(diff.added) {
                            self.sync(tuples, node, mode, left, &mut changes);
                        }
                    }
                }
            }
        }
        changes
    }

    /// Inserts or retracts the child of `left` to match its partner count.
    fn sync(
        &mut self,
        tuples: &mut Tuples,
        node: NodeId,
        mode: ExistenceMode,
        left: TupleKey,
        changes: &mut Changes,
    ) {
        if !self.memory.contains(InputSide::Left, left) {
            return;
        }
        let live = mode.is_live(self.memory.left_partner_count(left));
        match (self.outputs.get(&left).copied(), live) {
            (None, true) => {
                let child = create(tuples, node, items_of(tuples, left));
                self.outputs.insert(left, child);
                changes.push(Change::Insert(child));
            }
            (Some(child), false) => {
                self.outputs.remove(&left);
                changes.push(Change::Retract(child));
            }
            _ => {}
        }
    }
}
