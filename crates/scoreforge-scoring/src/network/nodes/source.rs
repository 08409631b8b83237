use std::collections::HashMap;

use scoreforge_core::domain::{FactId, FactStore};
use scoreforge_core::Value;
use smallvec::smallvec;

use super::{create, Change, Changes, TupleKey, Tuples};
use crate::network::definition::NodeId;

/// One tuple per fact of the source class.
#[derive(Default)]
pub(crate) struct SourceState {
    tuples: HashMap<FactId, TupleKey>,
}

/// Whether `fact` has every required genuine variable assigned.
fn is_assigned(store: &FactStore, fact: FactId) -> bool {
    let Some(record) = store.get(fact) else {
        return false;
    };
    let class = store.schema().class(fact.class());
    class
        .required_genuine_fields()
        .all(|field| record.fields().get(field).is_some_and(|v| !v.is_none()))
}

impl SourceState {
    pub(crate) fn insert(
        &mut self,
        tuples: &mut Tuples,
        store: &FactStore,
        node: NodeId,
        include_unassigned: bool,
        fact: FactId,
    ) -> Changes {
        if self.tuples.contains_key(&fact) {
            return self.update(tuples, store, node, include_unassigned, fact);
        }
        let mut changes = Changes::new();
        if include_unassigned || is_assigned(store, fact) {
            let tuple = create(tuples, node, smallvec![Value::Ref(fact)]);
            self.tuples.insert(fact, tuple);
            changes.push(Change::Insert(tuple));
        }
        changes
    }

    pub(crate) fn update(
        &mut self,
        tuples: &mut Tuples,
        store: &FactStore,
        node: NodeId,
        include_unassigned: bool,
        fact: FactId,
    ) -> Changes {
        let passes = include_unassigned || is_assigned(store, fact);
        let mut changes = Changes::new();
        match (self.tuples.get(&fact).copied(), passes) {
            (Some(tuple), true) => changes.push(Change::Update(tuple)),
            (Some(tuple), false) => {
                self.tuples.remove(&fact);
                changes.push(Change::Retract(tuple));
            }
            (None, true) => {
                let tuple = create(tuples, node, smallvec![Value::Ref(fact)]);
                self.tuples.insert(fact, tuple);
                changes.push(Change::Insert(tuple));
            }
            (None, false) => {}
        }
        changes
    }

    pub(crate) fn retract(&mut self, fact: FactId) -> Changes {
        let mut changes = Changes::new();
        if let Some(tuple) = self.tuples.remove(&fact) {
            changes.push(Change::Retract(tuple));
        }
        changes
    }
}
