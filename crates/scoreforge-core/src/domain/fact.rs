//! Fact identity, fact records and the per-class fact store.

use std::fmt;
use std::sync::Arc;

use slotmap::{Key, SlotMap};

use crate::error::UsageError;

use super::schema::{ClassId, FieldRef, SolutionSchema};
use super::Value;

slotmap::new_key_type! {
    /// Slot of a fact within its class.
    pub struct FactKey;
}

/// Stable identity of a fact.
///
/// Ids survive the removal of other facts and are never reissued, so an id
/// held by a tuple or a group key can always be tested for liveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactId {
    class: ClassId,
    key: FactKey,
}

impl FactId {
    #[inline]
    pub fn class(self) -> ClassId {
        self.class
    }

    #[inline]
    pub fn key(self) -> FactKey {
        self.key
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.class, self.key.data().as_ffi() as u32)
    }
}

static NONE: Value = Value::None;

/// One fact or planning entity: a class tag plus a value per declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct Fact {
    class: ClassId,
    fields: Vec<Value>,
}

impl Fact {
    /// Creates a fact of `class` with every field set to [`Value::None`].
    ///
    /// # Panics
    /// Panics if `class` was not issued by `schema`.
    pub fn new(schema: &SolutionSchema, class: ClassId) -> Self {
        Self {
            class,
            fields: vec![Value::None; schema.class(class).fields().len()],
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, field: FieldRef, value: impl Into<Value>) -> Self {
        self.set(field, value.into());
        self
    }

    #[inline]
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Reads a field, yielding `None` for a field of another class.
    #[inline]
    pub fn get(&self, field: FieldRef) -> &Value {
        if field.class() != self.class {
            return &NONE;
        }
        self.fields.get(field.index()).unwrap_or(&NONE)
    }

    /// Writes a field and returns the previous value.
    ///
    /// Writes to a field of another class are ignored.
    pub fn set(&mut self, field: FieldRef, value: Value) -> Value {
        if field.class() != self.class {
            return Value::None;
        }
        match self.fields.get_mut(field.index()) {
            Some(slot) => std::mem::replace(slot, value),
            None => Value::None,
        }
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }
}

/// Owns every fact of a working solution, bucketed by class.
#[derive(Clone)]
pub struct FactStore {
    schema: Arc<SolutionSchema>,
    classes: Vec<SlotMap<FactKey, Fact>>,
}

impl FactStore {
    pub fn new(schema: Arc<SolutionSchema>) -> Self {
        let classes = (0..schema.class_count()).map(|_| SlotMap::with_key()).collect();
        Self { schema, classes }
    }

    pub fn schema(&self) -> &Arc<SolutionSchema> {
        &self.schema
    }

    /// Stores a fact and returns its new identity.
    pub fn insert(&mut self, fact: Fact) -> FactId {
        let class = fact.class;
        let key = self.classes[class.index()].insert(fact);
        FactId { class, key }
    }

    pub fn remove(&mut self, id: FactId) -> Option<Fact> {
        self.classes.get_mut(id.class.index())?.remove(id.key)
    }

    pub fn get(&self, id: FactId) -> Option<&Fact> {
        self.classes.get(id.class.index())?.get(id.key)
    }

    pub fn get_mut(&mut self, id: FactId) -> Option<&mut Fact> {
        self.classes.get_mut(id.class.index())?.get_mut(id.key)
    }

    pub fn contains(&self, id: FactId) -> bool {
        self.get(id).is_some()
    }

    /// Reads a field of a fact; a removed fact reads as [`Value::None`].
    #[inline]
    pub fn value(&self, id: FactId, field: FieldRef) -> &Value {
        self.get(id).map_or(&NONE, |fact| fact.get(field))
    }

    /// Writes a field of a fact and returns the previous value.
    pub fn set(&mut self, id: FactId, field: FieldRef, value: Value) -> Result<Value, UsageError> {
        if field.class() != id.class {
            return Err(UsageError::ClassMismatch {
                fact: id,
                variable: self.schema.field_name(field),
            });
        }
        let fact = self.get_mut(id).ok_or(UsageError::UnknownFact { fact: id })?;
        Ok(fact.set(field, value))
    }

    /// Iterates the facts of one class in slot order.
    pub fn facts_of(&self, class: ClassId) -> impl Iterator<Item = (FactId, &Fact)> {
        self.classes
            .get(class.index())
            .into_iter()
            .flat_map(move |facts| facts.iter().map(move |(key, fact)| (FactId { class, key }, fact)))
    }

    /// Iterates every fact, class by class.
    pub fn iter(&self) -> impl Iterator<Item = (FactId, &Fact)> {
        self.classes.iter().enumerate().flat_map(|(c, facts)| {
            let class = ClassId(c as u32);
            facts.iter().map(move |(key, fact)| (FactId { class, key }, fact))
        })
    }

    pub fn count_of(&self, class: ClassId) -> usize {
        self.classes.get(class.index()).map_or(0, SlotMap::len)
    }

    pub fn len(&self) -> usize {
        self.classes.iter().map(SlotMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for FactStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(id, fact)| (id, fact.fields())))
            .finish()
    }
}
