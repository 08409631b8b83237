//! Working object lookup by planning id.

use std::collections::HashMap;

use scoreforge_core::domain::{ClassId, Fact, FactId, FactStore, SolutionSchema};
use scoreforge_core::{ConfigurationError, Value};

/// Index from (class, planning id) to the working fact.
#[derive(Debug, Default)]
pub(crate) struct LookUp {
    by_id: HashMap<(ClassId, Value), FactId>,
}

impl LookUp {
    pub(crate) fn build(store: &FactStore) -> Result<Self, ConfigurationError> {
        let mut lookup = Self::default();
        for (id, fact) in store.iter() {
            lookup.add(store.schema(), id, fact)?;
        }
        Ok(lookup)
    }

    pub(crate) fn add(
        &mut self,
        schema: &SolutionSchema,
        id: FactId,
        fact: &Fact,
    ) -> Result<(), ConfigurationError> {
        let class = schema.class(id.class());
        let Some(field) = class.planning_id() else {
            return Ok(());
        };
        let key = fact.fields().get(field).cloned().unwrap_or(Value::None);
        if key.is_none() {
            return Err(ConfigurationError::MissingPlanningId {
                class: class.name().to_string(),
            });
        }
        if let Some(&existing) = self.by_id.get(&(id.class(), key.clone())) {
            if existing != id {
                return Err(ConfigurationError::DuplicatePlanningId {
                    class: class.name().to_string(),
                    id: key.to_string(),
                });
            }
        }
        self.by_id.insert((id.class(), key), id);
        Ok(())
    }

    pub(crate) fn remove(&mut self, schema: &SolutionSchema, id: FactId, fact: &Fact) {
        if let Some(field) = schema.class(id.class()).planning_id() {
            if let Some(key) = fact.fields().get(field) {
                let key = (id.class(), key.clone());
                if self.by_id.get(&key) == Some(&id) {
                    self.by_id.remove(&key);
                }
            }
        }
    }

    /// The working fact of `class` with planning id `key`.
    pub(crate) fn get(
        &self,
        schema: &SolutionSchema,
        class: ClassId,
        key: &Value,
    ) -> Result<Option<FactId>, ConfigurationError> {
        let definition = schema.class(class);
        if definition.planning_id().is_none() {
            return Err(ConfigurationError::MissingPlanningId {
                class: definition.name().to_string(),
            });
        }
        Ok(self.by_id.get(&(class, key.clone())).copied())
    }
}
