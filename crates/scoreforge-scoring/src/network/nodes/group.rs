use std::collections::HashMap;
use std::sync::Arc;

use scoreforge_core::domain::FactStore;
use scoreforge_core::Value;
use smallvec::SmallVec;

use super::{create, view, Change, Changes, Items, TupleKey, Tuples};
use crate::network::definition::NodeId;
use crate::stream::collector::{Accumulator, Collector, Undo};
use crate::stream::Mapping;

struct Group {
    accumulators: Vec<Box<dyn Accumulator>>,
    count: usize,
    output: Option<TupleKey>,
}

/// Where a member tuple was accumulated and how to take it back out.
struct Membership {
    key: Value,
    undos: SmallVec<[Undo; 2]>,
}

/// Groups keyed by the group-key value, plus the membership of every input.
#[derive(Default)]
pub(crate) struct GroupState {
    groups: HashMap<Value, Group>,
    members: HashMap<TupleKey, Membership>,
}

impl GroupState {
    pub(crate) fn apply(
        &mut self,
        tuples: &mut Tuples,
        store: &FactStore,
        node: NodeId,
        key: Option<&Mapping>,
        collectors: &[Arc<dyn Collector>],
        change: Change,
    ) -> Changes {
        let mut changes = Changes::new();
        match change {
            Change::Insert(tuple) => {
                let group = self.add(tuples, store, key, collectors, tuple);
                self.flush(tuples, node, key.is_some(), &group, &mut changes);
            }
            Change::Update(tuple) => {
                let old = self.remove(tuple);
                let new = self.add(tuples, store, key, collectors, tuple);
                if let Some(old) = old.filter(|old| *old != new) {
                    self.flush(tuples, node, key.is_some(), &old, &mut changes);
                }
                self.flush(tuples, node, key.is_some(), &new, &mut changes);
            }
            Change::Retract(tuple) => {
                if let Some(old) = self.remove(tuple) {
                    self.flush(tuples, node, key.is_some(), &old, &mut changes);
                }
            }
        }
        changes
    }

    fn add(
        &mut self,
        tuples: &Tuples,
        store: &FactStore,
        key: Option<&Mapping>,
        collectors: &[Arc<dyn Collector>],
        tuple: TupleKey,
    ) -> Value {
        let view = view(tuples, store, tuple);
        let group_key = key.map_or(Value::None, |mapping| mapping.apply(&view));
        let group = self
            .groups
            .entry(group_key.clone())
            .or_insert_with(|| Group {
                accumulators: collectors.iter().map(|c| c.create_accumulator()).collect(),
                count: 0,
                output: None,
            });
        let undos = group
            .accumulators
            .iter_mut()
            .zip(collectors)
            .map(|(accumulator, collector)| accumulator.accumulate(collector.map(&view)))
            .collect();
        group.count += 1;
        self.members.insert(
            tuple,
            Membership {
                key: group_key.clone(),
                undos,
            },
        );
        group_key
    }

    fn remove(&mut self, tuple: TupleKey) -> Option<Value> {
        let membership = self.members.remove(&tuple)?;
        if let Some(group) = self.groups.get_mut(&membership.key) {
            for (accumulator, undo) in group.accumulators.iter_mut().zip(membership.undos) {
                accumulator.undo(undo);
            }
            group.count = group.count.saturating_sub(1);
        }
        Some(membership.key)
    }

    /// Brings the output tuple of group `key` in line with its accumulators.
    fn flush(
        &mut self,
        tuples: &mut Tuples,
        node: NodeId,
        keyed: bool,
        key: &Value,
        changes: &mut Changes,
    ) {
        let Some(group) = self.groups.get_mut(key) else {
            return;
        };
        if group.count == 0 {
            if let Some(output) = self.groups.remove(key).and_then(|g| g.output) {
                changes.push(Change::Retract(output));
            }
            return;
        }

        let mut items = Items::new();
        if keyed {
            items.push(key.clone());
        }
        items.extend(group.accumulators.iter().map(|a| a.result()));

        match group.output {
            None => {
                let output = create(tuples, node, items);
                group.output = Some(output);
                changes.push(Change::Insert(output));
            }
            Some(output) => {
                if let Some(record) = tuples.get_mut(output) {
                    if record.items != items {
                        record.items = items;
                        changes.push(Change::Update(output));
                    }
                }
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.groups.len()
    }
}
