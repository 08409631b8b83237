// Score director trait definition.

use scoreforge_core::domain::{ClassId, Fact, FactId, FieldRef, WorkingSolution};
use scoreforge_core::{Score, SolutionScore, Value};

use crate::error::Result;

// The score director is the single entry point for changes to the working
// solution.
//
// Every mutation must be bracketed by its before/after hook pair: the
// before hook runs while the fact still holds its old state, the after hook
// once the new state is in place. The director sequences the hooks into
// shadow propagation and the tuple network; nothing is recomputed until
// `trigger_variable_listeners` or `calculate_score`.
//
// The trait is object safe so moves can take `&mut dyn ScoreDirector`.
pub trait ScoreDirector<Sc: Score>: Send {
    // Returns a reference to the working solution.
    fn working_solution(&self) -> &WorkingSolution<Sc>;

    // Returns a mutable reference to the working solution.
    //
    // Changes made through it must be bracketed by hooks.
    fn working_solution_mut(&mut self) -> &mut WorkingSolution<Sc>;

    fn before_entity_added(&mut self, class: ClassId) -> Result<()>;

    fn after_entity_added(&mut self, entity: FactId) -> Result<()>;

    fn before_variable_changed(&mut self, entity: FactId, variable: FieldRef) -> Result<()>;

    fn after_variable_changed(&mut self, entity: FactId, variable: FieldRef) -> Result<()>;

    fn before_entity_removed(&mut self, entity: FactId) -> Result<()>;

    fn after_entity_removed(&mut self, entity: FactId) -> Result<()>;

    fn before_problem_fact_added(&mut self, class: ClassId) -> Result<()>;

    fn after_problem_fact_added(&mut self, fact: FactId) -> Result<()>;

    fn before_problem_property_changed(&mut self, fact: FactId) -> Result<()>;

    fn after_problem_property_changed(&mut self, fact: FactId) -> Result<()>;

    fn before_problem_fact_removed(&mut self, fact: FactId) -> Result<()>;

    fn after_problem_fact_removed(&mut self, fact: FactId) -> Result<()>;

    // Runs queued variable listeners until the cascade settles.
    fn trigger_variable_listeners(&mut self) -> Result<()>;

    // Settles all pending changes and returns the current score.
    fn calculate_score(&mut self) -> Result<SolutionScore<Sc>>;

    // Sets `variable` of `entity`, with hooks. Returns the old value.
    fn change_variable(&mut self, entity: FactId, variable: FieldRef, value: Value) -> Result<Value> {
        self.before_variable_changed(entity, variable)?;
        let old = self
            .working_solution_mut()
            .store_mut()
            .set(entity, variable, value)?;
        self.after_variable_changed(entity, variable)?;
        Ok(old)
    }

    // Inserts a new entity, with hooks.
    fn add_entity(&mut self, entity: Fact) -> Result<FactId> {
        self.before_entity_added(entity.class())?;
        let id = self.working_solution_mut().insert(entity);
        self.after_entity_added(id)?;
        Ok(id)
    }

    // Removes an entity, with hooks. Returns its last state.
    fn remove_entity(&mut self, entity: FactId) -> Result<Option<Fact>> {
        self.before_entity_removed(entity)?;
        let removed = self.working_solution_mut().store_mut().remove(entity);
        self.after_entity_removed(entity)?;
        Ok(removed)
    }

    fn add_problem_fact(&mut self, fact: Fact) -> Result<FactId> {
        self.before_problem_fact_added(fact.class())?;
        let id = self.working_solution_mut().insert(fact);
        self.after_problem_fact_added(id)?;
        Ok(id)
    }

    fn change_problem_property(&mut self, fact: FactId, field: FieldRef, value: Value) -> Result<Value> {
        self.before_problem_property_changed(fact)?;
        let old = self.working_solution_mut().store_mut().set(fact, field, value)?;
        self.after_problem_property_changed(fact)?;
        Ok(old)
    }

    fn remove_problem_fact(&mut self, fact: FactId) -> Result<Option<Fact>> {
        self.before_problem_fact_removed(fact)?;
        let removed = self.working_solution_mut().store_mut().remove(fact);
        self.after_problem_fact_removed(fact)?;
        Ok(removed)
    }
}
