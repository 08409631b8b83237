//! Fact changes waiting to be pushed into the tuple network.

use std::collections::HashMap;

use scoreforge_core::FactId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingChange {
    Insert,
    Update,
    Retract,
}

/// Coalesced per-fact changes since the last settle.
///
/// Two changes to the same fact collapse into one: a retraction followed by
/// an insertion is an update, an insertion followed by a retraction cancels
/// out, and updates are absorbed by a pending insertion or retraction.
#[derive(Debug, Default)]
pub(crate) struct PendingChanges {
    order: Vec<FactId>,
    changes: HashMap<FactId, PendingChange>,
}

impl PendingChanges {
    pub(crate) fn insert(&mut self, fact: FactId) {
        match self.changes.get(&fact) {
            Some(PendingChange::Retract) => {
                self.changes.insert(fact, PendingChange::Update);
            }
            Some(_) => {}
            None => self.push(fact, PendingChange::Insert),
        }
    }

    pub(crate) fn update(&mut self, fact: FactId) {
        if !self.changes.contains_key(&fact) {
            self.push(fact, PendingChange::Update);
        }
    }

    pub(crate) fn retract(&mut self, fact: FactId) {
        match self.changes.get(&fact) {
            Some(PendingChange::Insert) => {
                self.changes.remove(&fact);
            }
            Some(PendingChange::Retract) => {}
            _ => self.push(fact, PendingChange::Retract),
        }
    }

    fn push(&mut self, fact: FactId, change: PendingChange) {
        if self.changes.insert(fact, change).is_none() {
            self.order.push(fact);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Takes every change: retractions first, then updates, then insertions,
    /// each in the order first recorded.
    pub(crate) fn drain(&mut self) -> Vec<(FactId, PendingChange)> {
        let order = std::mem::take(&mut self.order);
        let mut changes = std::mem::take(&mut self.changes);
        let mut drained: Vec<(FactId, PendingChange)> = order
            .into_iter()
            .filter_map(|fact| changes.remove(&fact).map(|change| (fact, change)))
            .collect();
        drained.sort_by_key(|&(_, change)| match change {
            PendingChange::Retract => 0,
            PendingChange::Update => 1,
            PendingChange::Insert => 2,
        });
        drained
    }

    pub(crate) fn clear(&mut self) {
        self.order.clear();
        self.changes.clear();
    }
}

#[cfg(test)]
mod tests {
    use scoreforge_core::SimpleScore;
    use scoreforge_test::Assignment;

    use super::*;

    fn facts(n: usize) -> Vec<FactId> {
        let fixture = Assignment::new();
        let assignments = vec![None; n];
        fixture.solution::<SimpleScore>(&[], &assignments).1
    }

    #[test]
    fn test_retract_then_insert_is_update() {
        let ids = facts(1);
        let mut pending = PendingChanges::default();
        pending.retract(ids[0]);
        pending.insert(ids[0]);
        assert_eq!(pending.drain(), vec![(ids[0], PendingChange::Update)]);
    }

    #[test]
    fn test_insert_then_retract_cancels() {
        let ids = facts(1);
        let mut pending = PendingChanges::default();
        pending.insert(ids[0]);
        pending.update(ids[0]);
        pending.retract(ids[0]);
        assert!(pending.is_empty());
        assert!(pending.drain().is_empty());
    }

    #[test]
    fn test_drain_orders_by_kind() {
        let ids = facts(3);
        let mut pending = PendingChanges::default();
        pending.insert(ids[0]);
        pending.update(ids[1]);
        pending.update(ids[2]);
        pending.retract(ids[2]);
        assert_eq!(
            pending.drain(),
            vec![
                (ids[2], PendingChange::Retract),
                (ids[1], PendingChange::Update),
                (ids[0], PendingChange::Insert),
            ]
        );
    }
}
