//! Live evaluation of a [`NetworkDefinition`].

use std::sync::Arc;

use scoreforge_core::domain::{FactId, FactStore};
use scoreforge_core::{Score, Value};
use smallvec::SmallVec;

use super::definition::{InputSide, NetworkDefinition, NodeId, NodeKind};
use super::nodes::{Change, NodeState, Tuples};
use crate::api::analysis::ConstraintMatchTotal;
use crate::inliner::ScoreInliner;

/// The node memories and score of one network instance.
///
/// Fact changes enter at the source nodes of the fact's class and flow
/// depth first through the children. Every tuple a node emits is delivered
/// to all of its children before the next one is processed.
pub struct TupleNetwork<Sc: Score> {
    definition: Arc<NetworkDefinition<Sc>>,
    tuples: Tuples,
    states: Vec<NodeState<Sc>>,
    inliner: ScoreInliner<Sc>,
}

#[derive(Clone, Copy)]
enum FactChange {
    Insert,
    Update,
    Retract,
}

impl<Sc: Score> TupleNetwork<Sc> {
    pub fn new(definition: Arc<NetworkDefinition<Sc>>, constraint_match_enabled: bool) -> Self {
        let states = definition
            .nodes()
            .iter()
            .map(|node| NodeState::new(node.kind()))
            .collect();
        let inliner = ScoreInliner::new(definition.constraints(), constraint_match_enabled);
        Self {
            definition,
            tuples: Tuples::with_key(),
            states,
            inliner,
        }
    }

    /// Builds a network and inserts every fact of `store`.
    pub fn from_store(
        definition: Arc<NetworkDefinition<Sc>>,
        store: &FactStore,
        constraint_match_enabled: bool,
    ) -> Self {
        let mut network = Self::new(definition, constraint_match_enabled);
        let facts: Vec<FactId> = store.iter().map(|(id, _)| id).collect();
        for fact in facts {
            network.insert(store, fact);
        }
        network
    }

    pub fn definition(&self) -> &Arc<NetworkDefinition<Sc>> {
        &self.definition
    }

    pub fn insert(&mut self, store: &FactStore, fact: FactId) {
        self.apply(store, fact, FactChange::Insert);
    }

    /// Re-evaluates `fact` after any of its fields changed.
    pub fn update(&mut self, store: &FactStore, fact: FactId) {
        self.apply(store, fact, FactChange::Update);
    }

    /// Removes every tuple derived from `fact`.
    ///
    /// The fact may already be gone from `store`; no field is read.
    pub fn retract(&mut self, store: &FactStore, fact: FactId) {
        self.apply(store, fact, FactChange::Retract);
    }

    pub fn score(&self) -> Sc {
        self.inliner.score()
    }

    pub fn inliner(&self) -> &ScoreInliner<Sc> {
        &self.inliner
    }

    pub fn constraint_match_totals(&self) -> Vec<ConstraintMatchTotal<Sc>> {
        self.inliner.constraint_match_totals()
    }

    /// Live tuples across all nodes.
    pub fn tuple_count(&self) -> usize {
        self.tuples.len()
    }

    /// Live groups across all group nodes.
    pub fn group_count(&self) -> usize {
        self.states.iter().map(NodeState::group_count).sum()
    }

    /// Every live tuple as (node, items), sorted.
    ///
    /// Tuple handles are not stable across retraction and re-insertion;
    /// this view is.
    pub fn live_tuples(&self) -> Vec<(NodeId, Vec<Value>)> {
        let mut live: Vec<(NodeId, Vec<Value>)> = self
            .tuples
            .values()
            .map(|record| (record.node, record.items.to_vec()))
            .collect();
        live.sort();
        live
    }

    fn apply(&mut self, store: &FactStore, fact: FactId, change: FactChange) {
        let sources: SmallVec<[NodeId; 2]> =
            SmallVec::from_slice(self.definition.sources_of(fact.class()));
        for node in sources {
            let include_unassigned = match self.definition.node(node).kind() {
                NodeKind::Source {
                    include_unassigned, ..
                } => *include_unassigned,
                _ => continue,
            };
            let NodeState::Source(state) = &mut self.states[node.index()] else {
                continue;
            };
            let changes = match change {
                FactChange::Insert => {
                    state.insert(&mut self.tuples, store, node, include_unassigned, fact)
                }
                FactChange::Update => {
                    state.update(&mut self.tuples, store, node, include_unassigned, fact)
                }
                FactChange::Retract => state.retract(fact),
            };
            for change in changes {
                self.emit(store, node, change);
            }
        }
    }

    /// Delivers `change` of a tuple owned by `node` to all children.
    fn emit(&mut self, store: &FactStore, node: NodeId, change: Change) {
        let definition = Arc::clone(&self.definition);
        for &(child, side) in definition.node(node).children() {
            let changes = self.deliver(store, child, side, change);
            for next in changes {
                self.emit(store, child, next);
            }
        }
        if let Change::Retract(tuple) = change {
            self.tuples.remove(tuple);
        }
    }

    fn deliver(
        &mut self,
        store: &FactStore,
        node: NodeId,
        side: InputSide,
        change: Change,
    ) -> SmallVec<[Change; 4]> {
        let Self {
            definition,
            tuples,
            states,
            inliner,
        } = self;
        let kind = definition.node(node).kind();
        match (kind, &mut states[node.index()]) {
            (NodeKind::Filter(predicate), NodeState::Filter(state)) => {
                state.apply(tuples, store, node, predicate, change)
            }
            (NodeKind::Join(joiners), NodeState::Join(state)) => {
                state.apply(tuples, store, node, joiners, side, change)
            }
            (NodeKind::Exists { joiners, mode }, NodeState::Exists(state)) => {
                state.apply(tuples, store, node, joiners, *mode, side, change)
            }
            (NodeKind::Group { key, collectors }, NodeState::Group(state)) => {
                state.apply(tuples, store, node, key.as_ref(), collectors, change)
            }
            (NodeKind::Score { constraint, weigher }, NodeState::Score(state)) => {
                state.apply(
                    tuples,
                    store,
                    *constraint,
                    definition.constraint(*constraint),
                    weigher,
                    inliner,
                    change,
                );
                SmallVec::new()
            }
            _ => SmallVec::new(),
        }
    }
}
