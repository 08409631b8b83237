//! SwapMove - exchanges variable values between two entities.

use smallvec::SmallVec;

use scoreforge_core::{FactId, FieldRef, Score};

use super::Move;
use crate::director::ScoreDirector;
use crate::error::Result;

/// A move that swaps the values of one or more variables between two
/// entities of the same class.
///
/// A swap is its own inverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapMove {
    entities: [FactId; 2],
    variables: SmallVec<[FieldRef; 2]>,
}

impl SwapMove {
    pub fn new(left: FactId, right: FactId, variables: impl IntoIterator<Item = FieldRef>) -> Self {
        Self {
            entities: [left, right],
            variables: variables.into_iter().collect(),
        }
    }

    pub fn left(&self) -> FactId {
        self.entities[0]
    }

    pub fn right(&self) -> FactId {
        self.entities[1]
    }

    pub fn variables(&self) -> &[FieldRef] {
        &self.variables
    }
}

impl<Sc: Score> Move<Sc> for SwapMove {
    fn is_doable(&self, score_director: &dyn ScoreDirector<Sc>) -> bool {
        let store = score_director.working_solution().store();
        let (left, right) = (self.left(), self.right());
        left != right
            && store.contains(left)
            && store.contains(right)
            && self
                .variables
                .iter()
                .any(|&variable| store.value(left, variable) != store.value(right, variable))
    }

    fn do_move(&self, score_director: &mut dyn ScoreDirector<Sc>) -> Result<Box<dyn Move<Sc>>> {
        let (left, right) = (self.left(), self.right());
        for &variable in &self.variables {
            let store = score_director.working_solution().store();
            let left_value = store.value(left, variable).clone();
            let right_value = store.value(right, variable).clone();
            if left_value == right_value {
                continue;
            }
            score_director.before_variable_changed(left, variable)?;
            score_director.before_variable_changed(right, variable)?;
            let store = score_director.working_solution_mut().store_mut();
            store.set(left, variable, right_value)?;
            store.set(right, variable, left_value)?;
            score_director.after_variable_changed(left, variable)?;
            score_director.after_variable_changed(right, variable)?;
        }
        Ok(Box::new(self.clone()))
    }

    fn entities(&self) -> &[FactId] {
        &self.entities
    }
}
