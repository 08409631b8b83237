//! Variable listener infrastructure for shadow variable updates.
//!
//! A listener declares the variables it reads (sources) and the shadow
//! variables it writes (targets). Score directors queue a listener once per
//! affected entity and run queued listeners in dependency order, handing
//! each a [`ShadowWriter`] through which it updates its targets.

use std::fmt;
use std::sync::Arc;

use crate::error::{ListenerError, UsageError};

use super::fact::{FactId, FactStore};
use super::schema::FieldRef;
use super::Value;

/// Write access to shadow variables while a listener runs.
pub trait ShadowWriter {
    fn store(&self) -> &FactStore;

    /// Sets a shadow variable owned by the running listener.
    ///
    /// Setting the current value again is a no-op and does not notify
    /// downstream listeners.
    fn set_shadow(&mut self, entity: FactId, field: FieldRef, value: Value)
        -> Result<(), UsageError>;

    fn value(&self, entity: FactId, field: FieldRef) -> &Value {
        self.store().value(entity, field)
    }
}

/// A listener that is notified when one of its source variables changes.
///
/// # Implementation Notes
///
/// - Only modify the shadow variables this listener declares as targets
/// - Never modify genuine variables or problem facts
/// - A single listener may update shadow variables on several entities
pub trait VariableListener: Send {
    /// Called before a source variable changes; the store still holds old values.
    fn before_variable_changed(&mut self, _store: &FactStore, _entity: FactId) {}

    /// Called after a source variable of `entity` has changed.
    fn after_variable_changed(
        &mut self,
        writer: &mut dyn ShadowWriter,
        entity: FactId,
    ) -> Result<(), ListenerError>;

    /// Called after `entity` has been added, and when listeners are force-triggered.
    fn after_entity_added(
        &mut self,
        writer: &mut dyn ShadowWriter,
        entity: FactId,
    ) -> Result<(), ListenerError> {
        self.after_variable_changed(writer, entity)
    }

    /// Called before `entity` is removed.
    fn before_entity_removed(&mut self, _store: &FactStore, _entity: FactId) {}

    /// Called when the working solution is replaced.
    fn reset_working_solution(&mut self, _store: &FactStore) {}
}

/// Kind of change that queued a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableNotification {
    EntityAdded,
    VariableChanged,
}

/// Creates a fresh listener for each score director.
pub type ListenerFactory = Arc<dyn Fn() -> Box<dyn VariableListener> + Send + Sync>;

/// A listener's name, sources, targets and factory.
///
/// # Example
///
/// ```
/// use scoreforge_core::domain::{
///     ClassDef, FactId, ListenerDeclaration, ShadowWriter, SolutionSchema, VariableListener,
/// };
/// use scoreforge_core::ListenerError;
///
/// struct Noop;
///
/// impl VariableListener for Noop {
///     fn after_variable_changed(
///         &mut self,
///         _writer: &mut dyn ShadowWriter,
///         _entity: FactId,
///     ) -> Result<(), ListenerError> {
///         Ok(())
///     }
/// }
///
/// let mut builder = SolutionSchema::builder();
/// builder
///     .class(ClassDef::entity("Visit").with_genuine("vehicle").with_shadow("arrival"))
///     .unwrap();
/// let vehicle = builder.field_ref("Visit", "vehicle").unwrap();
/// let arrival = builder.field_ref("Visit", "arrival").unwrap();
/// builder.listener(ListenerDeclaration::new("ArrivalListener", || Box::new(Noop))
///     .source(vehicle)
///     .target(arrival));
/// assert!(builder.build().is_ok());
/// ```
#[derive(Clone)]
pub struct ListenerDeclaration {
    name: Arc<str>,
    sources: Vec<FieldRef>,
    targets: Vec<FieldRef>,
    factory: ListenerFactory,
}

impl ListenerDeclaration {
    pub fn new<F>(name: &str, factory: F) -> Self
    where
        F: Fn() -> Box<dyn VariableListener> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            sources: Vec::new(),
            targets: Vec::new(),
            factory: Arc::new(factory),
        }
    }

    pub fn source(mut self, field: FieldRef) -> Self {
        if !self.sources.contains(&field) {
            self.sources.push(field);
        }
        self
    }

    pub fn target(mut self, field: FieldRef) -> Self {
        if !self.targets.contains(&field) {
            self.targets.push(field);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sources(&self) -> &[FieldRef] {
        &self.sources
    }

    pub fn targets(&self) -> &[FieldRef] {
        &self.targets
    }

    pub fn create(&self) -> Box<dyn VariableListener> {
        (self.factory)()
    }
}

impl fmt::Debug for ListenerDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerDeclaration")
            .field("name", &self.name)
            .field("sources", &self.sources)
            .field("targets", &self.targets)
            .finish()
    }
}
