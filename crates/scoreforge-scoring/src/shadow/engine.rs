use std::collections::HashSet;
use std::sync::Arc;

use scoreforge_core::domain::{
    FactId, FactStore, ShadowWriter, VariableListener, VariableNotification,
};
use scoreforge_core::{FieldRef, UsageError, Value};
use tracing::trace;

use super::graph::ShadowGraph;
use super::queue::NotificationQueue;
use crate::error::{Result, ScoreDirectorError};

type Slots = Vec<Option<Box<dyn VariableListener>>>;

/// One director's listener instances and their notification queue.
pub struct ShadowEngine {
    graph: Arc<ShadowGraph>,
    listeners: Slots,
    queue: NotificationQueue,
}

impl ShadowEngine {
    pub fn new(graph: Arc<ShadowGraph>) -> Self {
        let listeners = graph.instantiate();
        Self {
            graph,
            listeners,
            queue: NotificationQueue::default(),
        }
    }

    pub fn graph(&self) -> &Arc<ShadowGraph> {
        &self.graph
    }

    /// Forgets queued notifications and resets every listener.
    pub fn reset(&mut self, store: &FactStore) {
        self.queue.clear();
        for listener in self.listeners.iter_mut().flatten() {
            listener.reset_working_solution(store);
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Queues the readers of `field` for `entity`, before the change.
    ///
    /// A reader's before-hook runs only when it was not queued for this
    /// entity yet, so it observes the values from before the round.
    pub fn before_variable_changed(&mut self, store: &FactStore, entity: FactId, field: FieldRef) {
        for &order in self.graph.readers_of(field) {
            if self
                .queue
                .enqueue(order, entity, VariableNotification::VariableChanged)
            {
                if let Some(Some(listener)) = self.listeners.get_mut(order) {
                    listener.before_variable_changed(store, entity);
                }
            }
        }
    }

    pub fn after_entity_added(&mut self, entity: FactId) {
        for &order in self.graph.listeners_of_class(entity.class()) {
            self.queue
                .enqueue(order, entity, VariableNotification::EntityAdded);
        }
    }

    pub fn before_entity_removed(&mut self, store: &FactStore, entity: FactId) {
        for &order in self.graph.listeners_of_class(entity.class()) {
            if let Some(Some(listener)) = self.listeners.get_mut(order) {
                listener.before_entity_removed(store, entity);
            }
        }
        self.queue.remove_entity(entity);
    }

    /// Drains the queue, settling the whole cascade.
    ///
    /// Returns the entities whose shadow variables changed. If a listener
    /// fails, every shadow write of this round is undone and the queue is
    /// cleared before the error is returned.
    pub fn trigger(&mut self, store: &mut FactStore) -> Result<Vec<FactId>> {
        if self.queue.is_empty() {
            return Ok(Vec::new());
        }
        trace!(event = "shadow_drain", queued = self.queue.len());

        let mut log: Vec<(FactId, FieldRef, Value)> = Vec::new();
        let mut touched: Vec<FactId> = Vec::new();
        let mut seen: HashSet<FactId> = HashSet::new();

        while let Some((order, entity, notification)) = self.queue.pop() {
            if !store.contains(entity) {
                continue;
            }
            let Some(mut listener) = self.listeners.get_mut(order).and_then(Option::take) else {
                continue;
            };
            let outcome = {
                let mut context = ShadowContext {
                    store: &mut *store,
                    graph: &self.graph,
                    listeners: &mut self.listeners,
                    queue: &mut self.queue,
                    running: order,
                    log: &mut log,
                    touched: &mut touched,
                    seen: &mut seen,
                };
                match notification {
                    VariableNotification::EntityAdded => {
                        listener.after_entity_added(&mut context, entity)
                    }
                    VariableNotification::VariableChanged => {
                        listener.after_variable_changed(&mut context, entity)
                    }
                }
            };
            self.listeners[order] = Some(listener);

            if let Err(source) = outcome {
                for (fact, field, old) in log.into_iter().rev() {
                    if let Some(record) = store.get_mut(fact) {
                        record.set(field, old);
                    }
                }
                self.queue.clear();
                return Err(ScoreDirectorError::ListenerFailed {
                    listener: self.graph.name(order).to_string(),
                    entity,
                    source,
                });
            }
        }
        Ok(touched)
    }

    /// Re-runs every listener on every entity of its source classes.
    pub fn force_trigger(&mut self, store: &mut FactStore) -> Result<Vec<FactId>> {
        for order in 0..self.graph.len() {
            for class in self.graph.source_classes(order) {
                for (entity, _) in store.facts_of(class) {
                    self.queue
                        .enqueue(order, entity, VariableNotification::EntityAdded);
                }
            }
        }
        self.trigger(store)
    }
}

/// The [`ShadowWriter`] handed to a running listener.
struct ShadowContext<'a> {
    store: &'a mut FactStore,
    graph: &'a ShadowGraph,
    listeners: &'a mut Slots,
    queue: &'a mut NotificationQueue,
    running: usize,
    log: &'a mut Vec<(FactId, FieldRef, Value)>,
    touched: &'a mut Vec<FactId>,
    seen: &'a mut HashSet<FactId>,
}

impl ShadowWriter for ShadowContext<'_> {
    fn store(&self) -> &FactStore {
        self.store
    }

    fn set_shadow(
        &mut self,
        entity: FactId,
        field: FieldRef,
        value: Value,
    ) -> std::result::Result<(), UsageError> {
        if self.graph.owner(field) != Some(self.running) {
            return Err(UsageError::ShadowVariableNotOwned {
                variable: self.store.schema().field_name(field),
                listener: self.graph.name(self.running).to_string(),
            });
        }
        if !self.store.contains(entity) {
            return Err(UsageError::UnknownFact { fact: entity });
        }
        if *self.store.value(entity, field) == value {
            return Ok(());
        }

        for &order in self.graph.readers_of(field) {
            if self
                .queue
                .enqueue(order, entity, VariableNotification::VariableChanged)
            {
                if let Some(Some(listener)) = self.listeners.get_mut(order) {
                    listener.before_variable_changed(self.store, entity);
                }
            }
        }

        let old = self.store.set(entity, field, value)?;
        self.log.push((entity, field, old));
        if self.seen.insert(entity) {
            self.touched.push(entity);
        }
        Ok(())
    }
}
