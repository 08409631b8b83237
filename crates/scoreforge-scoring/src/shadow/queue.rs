use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use scoreforge_core::domain::{FactId, VariableNotification};

/// Pending (listener, entity) notifications, popped in global shadow order.
///
/// A pair is queued at most once until it is popped; a second notification
/// for the same pair is absorbed by the first.
#[derive(Debug, Default)]
pub(crate) struct NotificationQueue {
    heap: BinaryHeap<Reverse<(usize, u64, FactId)>>,
    present: HashMap<(usize, FactId), VariableNotification>,
    sequence: u64,
}

impl NotificationQueue {
    /// Returns true if the pair was not queued yet.
    pub(crate) fn enqueue(
        &mut self,
        order: usize,
        entity: FactId,
        notification: VariableNotification,
    ) -> bool {
        if self.present.contains_key(&(order, entity)) {
            return false;
        }
        self.present.insert((order, entity), notification);
        self.sequence += 1;
        self.heap.push(Reverse((order, self.sequence, entity)));
        true
    }

    pub(crate) fn pop(&mut self) -> Option<(usize, FactId, VariableNotification)> {
        while let Some(Reverse((order, _, entity))) = self.heap.pop() {
            if let Some(notification) = self.present.remove(&(order, entity)) {
                return Some((order, entity, notification));
            }
        }
        None
    }

    /// Drops every notification for `entity`.
    pub(crate) fn remove_entity(&mut self, entity: FactId) {
        self.present.retain(|&(_, e), _| e != entity);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.present.len()
    }

    pub(crate) fn clear(&mut self) {
        self.heap.clear();
        self.present.clear();
    }
}
