//! The working solution mutated in place by a score director.

use std::sync::Arc;

use crate::score::{Score, SolutionScore};

use super::fact::{Fact, FactId, FactStore};
use super::schema::{ClassKind, SolutionSchema};

/// Root object holding all facts, entities and the last calculated score.
#[derive(Clone, Debug)]
pub struct WorkingSolution<Sc: Score> {
    store: FactStore,
    score: Option<SolutionScore<Sc>>,
}

impl<Sc: Score> WorkingSolution<Sc> {
    pub fn new(schema: Arc<SolutionSchema>) -> Self {
        Self {
            store: FactStore::new(schema),
            score: None,
        }
    }

    pub fn schema(&self) -> &Arc<SolutionSchema> {
        self.store.schema()
    }

    pub fn store(&self) -> &FactStore {
        &self.store
    }

    /// Direct mutable access; callers must bracket changes with director hooks.
    pub fn store_mut(&mut self) -> &mut FactStore {
        &mut self.store
    }

    pub fn insert(&mut self, fact: Fact) -> FactId {
        self.store.insert(fact)
    }

    pub fn score(&self) -> Option<SolutionScore<Sc>> {
        self.score
    }

    pub fn set_score(&mut self, score: Option<SolutionScore<Sc>>) {
        self.score = score;
    }

    /// Number of required genuine variables currently holding `None`.
    pub fn uninitialized_variable_count(&self) -> usize {
        self.schema()
            .classes()
            .filter(|(_, class)| class.kind() == ClassKind::Entity)
            .map(|(id, _)| {
                self.store
                    .facts_of(id)
                    .map(|(fact_id, _)| self.uninitialized_variables_of(fact_id))
                    .sum::<usize>()
            })
            .sum()
    }

    /// Number of required genuine variables of one entity holding `None`.
    pub fn uninitialized_variables_of(&self, id: FactId) -> usize {
        let Some(fact) = self.store.get(id) else {
            return 0;
        };
        self.schema()
            .class(id.class())
            .required_genuine_fields()
            .filter(|&i| fact.fields()[i].is_none())
            .count()
    }

    /// The initialization score: minus the uninitialized variable count.
    pub fn init_score(&self) -> i64 {
        -(self.uninitialized_variable_count() as i64)
    }
}
