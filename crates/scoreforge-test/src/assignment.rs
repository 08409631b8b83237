//! Entities assigned to values.
//!
//! `Slot` problem facts are the value range; `Entity` planning entities
//! carry a genuine `value` variable referencing a slot.
//!
//! # Example
//!
//! ```
//! use scoreforge_test::Assignment;
//!
//! let fixture = Assignment::new();
//! let (solution, entities) = fixture.solution::<scoreforge_core::SimpleScore>(&["v1", "v2"], &[Some(0), Some(0), None]);
//! assert_eq!(entities.len(), 3);
//! assert_eq!(solution.init_score(), -1);
//! ```

use std::sync::Arc;

use scoreforge_core::domain::{ClassDef, ClassId, Fact, FactId, FieldRef, SolutionSchema, WorkingSolution};
use scoreforge_core::{Score, Value};

/// Schema and accessors for the assignment fixture.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub schema: Arc<SolutionSchema>,
    pub slot: ClassId,
    pub entity: ClassId,
    pub slot_id: FieldRef,
    pub entity_id: FieldRef,
    /// Genuine variable of `Entity`.
    pub value: FieldRef,
    /// Plain field of `Entity` used by weighted constraints.
    pub weight: FieldRef,
}

impl Assignment {
    pub fn new() -> Self {
        let mut builder = SolutionSchema::builder();
        let slot = builder
            .class(ClassDef::problem_fact("Slot").with_planning_id("id"))
            .expect("valid slot class");
        let entity = builder
            .class(
                ClassDef::entity("Entity")
                    .with_planning_id("id")
                    .with_field("weight")
                    .with_genuine("value"),
            )
            .expect("valid entity class");
        let schema = builder.build().expect("valid schema");
        Self {
            slot_id: schema.field_ref("Slot", "id").expect("field"),
            entity_id: schema.field_ref("Entity", "id").expect("field"),
            value: schema.field_ref("Entity", "value").expect("field"),
            weight: schema.field_ref("Entity", "weight").expect("field"),
            schema,
            slot,
            entity,
        }
    }

    pub fn slot_fact(&self, name: &str) -> Fact {
        Fact::new(&self.schema, self.slot).with(self.slot_id, name)
    }

    /// An entity with weight 1 assigned to `value`.
    pub fn entity_fact(&self, id: i64, value: Option<FactId>) -> Fact {
        Fact::new(&self.schema, self.entity)
            .with(self.entity_id, id)
            .with(self.weight, 1)
            .with(self.value, value)
    }

    /// Builds a solution with one slot per name and one entity per
    /// assignment, where `Some(i)` assigns the `i`-th slot.
    ///
    /// Returns the solution, then the entity ids in order.
    pub fn solution<Sc: Score>(
        &self,
        slots: &[&str],
        assignments: &[Option<usize>],
    ) -> (WorkingSolution<Sc>, Vec<FactId>) {
        let mut solution = WorkingSolution::new(Arc::clone(&self.schema));
        let slot_ids: Vec<FactId> = slots
            .iter()
            .map(|name| solution.insert(self.slot_fact(name)))
            .collect();
        let entities = assignments
            .iter()
            .enumerate()
            .map(|(i, assigned)| {
                let value = assigned.map(|s| slot_ids[s]);
                solution.insert(self.entity_fact(i as i64, value))
            })
            .collect();
        (solution, entities)
    }

    /// Slot ids of a solution, in slot order.
    pub fn slots<Sc: Score>(&self, solution: &WorkingSolution<Sc>) -> Vec<FactId> {
        solution.store().facts_of(self.slot).map(|(id, _)| id).collect()
    }

    pub fn value_of<Sc: Score>(&self, solution: &WorkingSolution<Sc>, entity: FactId) -> Value {
        solution.store().value(entity, self.value).clone()
    }
}

impl Default for Assignment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use scoreforge_core::SimpleScore;

    use super::*;

    #[test]
    fn test_solution_assigns_slots() {
        let fixture = Assignment::new();
        let (solution, entities) = fixture.solution::<SimpleScore>(&["v1", "v2"], &[Some(1), None]);
        let slots = fixture.slots(&solution);

        assert_eq!(slots.len(), 2);
        assert_eq!(fixture.value_of(&solution, entities[0]), Value::Ref(slots[1]));
        assert!(fixture.value_of(&solution, entities[1]).is_none());
        assert_eq!(solution.init_score(), -1);
    }
}
