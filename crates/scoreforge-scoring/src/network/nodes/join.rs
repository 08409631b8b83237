use std::collections::HashMap;

use scoreforge_core::domain::FactStore;
use scoreforge_core::Value;

use super::{create, view, Change, Changes, Items, TupleKey, Tuples};
use crate::network::definition::{InputSide, NodeId};
use crate::network::index::BetaMemory;
use crate::stream::joiner::{IndexKey, JoinerSet};

/// Joined pairs of a two-input join.
pub(crate) struct JoinState {
    memory: BetaMemory,
    /// (left, right) -> joined child
    outputs: HashMap<(TupleKey, TupleKey), TupleKey>,
}

/// Orders `tuple` and `partner` as (left, right).
#[inline]
fn pair(side: InputSide, tuple: TupleKey, partner: TupleKey) -> (TupleKey, TupleKey) {
    match side {
        InputSide::Left => (tuple, partner),
        InputSide::Right => (partner, tuple),
    }
}

fn joined_items(tuples: &Tuples, (left, right): (TupleKey, TupleKey)) -> Items {
    let mut items = Items::new();
    for key in [left, right] {
        if let Some(record) = tuples.get(key) {
            items.extend(record.items.iter().cloned());
        }
    }
    items
}

impl JoinState {
    pub(crate) fn new(memory: BetaMemory) -> Self {
        Self {
            memory,
            outputs: HashMap::new(),
        }
    }

    pub(crate) fn apply(
        &mut self,
        tuples: &mut Tuples,
        store: &FactStore,
        node: NodeId,
        joiners: &JoinerSet,
        side: InputSide,
        change: Change,
    ) -> Changes {
        let mut changes = Changes::new();
        match change {
            Change::Insert(tuple) => {
                let (eq, range) = keys(tuples, store, joiners, side, tuple);
                let partners = {
                    let snapshot: &Tuples = tuples;
                    self.memory.insert(side, tuple, eq, range, |other| {
                        accepts(snapshot, store, joiners, pair(side, tuple, other))
                    })
                };
                for partner in partners {
                    self.open(tuples, node, pair(side, tuple, partner), &mut changes);
                }
            }
            Change::Update(tuple) => {
                let (eq, range) = keys(tuples, store, joiners, side, tuple);
                let diff = {
                    let snapshot: &Tuples = tuples;
                    self.memory.update(side, tuple, eq, range, |other| {
                        accepts(snapshot, store, joiners, pair(side, tuple, other))
                    })
                };
                for partner in diff.removed {
                    self.close(pair(side, tuple, partner), &mut changes);
                }
                for partner in diff.kept {
                    let key = pair(side, tuple, partner);
                    if let Some(&child) = self.outputs.get(&key) {
                        let items = joined_items(tuples, key);
                        if let Some(record) = tuples.get_mut(child) {
                            record.items = items;
                        }
                        changes.push(Change::Update(child));
                    }
                }
                for partner in diff.added {
                    self.open(tuples, node, pair(side, tuple, partner), &mut changes);
                }
            }
            Change::Retract(tuple) => {
                for partner in self.memory.retract(side, tuple) {
                    self.close(pair(side, tuple, partner), &mut changes);
                }
            }
        }
        changes
    }

    fn open(
        &mut self,
        tuples: &mut Tuples,
        node: NodeId,
        key: (TupleKey, TupleKey),
        changes: &mut Changes,
    ) {
        let child = create(tuples, node, joined_items(tuples, key));
        self.outputs.insert(key, child);
        changes.push(Change::Insert(child));
    }

    fn close(&mut self, key: (TupleKey, TupleKey), changes: &mut Changes) {
        if let Some(child) = self.outputs.remove(&key) {
            changes.push(Change::Retract(child));
        }
    }
}

pub(super) fn keys(
    tuples: &Tuples,
    store: &FactStore,
    joiners: &JoinerSet,
    side: InputSide,
    tuple: TupleKey,
) -> (IndexKey, Value) {
    let view = view(tuples, store, tuple);
    match side {
        InputSide::Left => (joiners.left_key(&view), joiners.left_range(&view)),
        InputSide::Right => (joiners.right_key(&view), joiners.right_range(&view)),
    }
}

pub(super) fn accepts(
    tuples: &Tuples,
    store: &FactStore,
    joiners: &JoinerSet,
    (left, right): (TupleKey, TupleKey),
) -> bool {
    joiners.post_matches(&view(tuples, store, left), &view(tuples, store, right))
}
