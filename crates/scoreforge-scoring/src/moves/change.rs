//! ChangeMove - assigns a value to a planning variable.

use scoreforge_core::{FactId, FieldRef, Score, Value};

use super::Move;
use crate::director::ScoreDirector;
use crate::error::Result;

/// A move that assigns a value to an entity's variable.
///
/// Its inverse is the change back to the value found when the move was done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeMove {
    entity: [FactId; 1],
    variable: FieldRef,
    to_value: Value,
}

impl ChangeMove {
    pub fn new(entity: FactId, variable: FieldRef, to_value: impl Into<Value>) -> Self {
        Self {
            entity: [entity],
            variable,
            to_value: to_value.into(),
        }
    }

    pub fn entity(&self) -> FactId {
        self.entity[0]
    }

    pub fn variable(&self) -> FieldRef {
        self.variable
    }

    /// Returns the target value.
    pub fn to_value(&self) -> &Value {
        &self.to_value
    }
}

impl<Sc: Score> Move<Sc> for ChangeMove {
    fn is_doable(&self, score_director: &dyn ScoreDirector<Sc>) -> bool {
        let store = score_director.working_solution().store();
        store.contains(self.entity())
            && *store.value(self.entity(), self.variable) != self.to_value
    }

    fn do_move(&self, score_director: &mut dyn ScoreDirector<Sc>) -> Result<Box<dyn Move<Sc>>> {
        let old = score_director.change_variable(self.entity(), self.variable, self.to_value.clone())?;
        Ok(Box::new(ChangeMove::new(self.entity(), self.variable, old)))
    }

    fn entities(&self) -> &[FactId] {
        &self.entity
    }
}
