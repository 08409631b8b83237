use std::collections::HashMap;

use scoreforge_core::domain::FactStore;

use super::{create, items_of, refresh, view, Change, Changes, TupleKey, Tuples};
use crate::network::definition::NodeId;
use crate::stream::Predicate;

/// Passing parent tuples and the child tuple created for each.
#[derive(Default)]
pub(crate) struct FilterState {
    passed: HashMap<TupleKey, TupleKey>,
}

impl FilterState {
    pub(crate) fn apply(
        &mut self,
        tuples: &mut Tuples,
        store: &FactStore,
        node: NodeId,
        predicate: &Predicate,
        change: Change,
    ) -> Changes {
        let mut changes = Changes::new();
        match change {
            Change::Insert(parent) => {
                if predicate.test(&view(tuples, store, parent)) {
                    let child = create(tuples, node, items_of(tuples, parent));
                    self.passed.insert(parent, child);
                    changes.push(Change::Insert(child));
                }
            }
            Change::Update(parent) => {
                let passes = predicate.test(&view(tuples, store, parent));
                match (self.passed.get(&parent).copied(), passes) {
                    (Some(child), true) => {
                        refresh(tuples, parent, child);
                        changes.push(Change::Update(child));
                    }
                    (Some(child), false) => {
                        self.passed.remove(&parent);
                        changes.push(Change::Retract(child));
                    }
                    (None, true) => {
                        let child = create(tuples, node, items_of(tuples, parent));
                        self.passed.insert(parent, child);
                        changes.push(Change::Insert(child));
                    }
                    (None, false) => {}
                }
            }
            Change::Retract(parent) => {
                if let Some(child) = self.passed.remove(&parent) {
                    changes.push(Change::Retract(child));
                }
            }
        }
        changes
    }
}
