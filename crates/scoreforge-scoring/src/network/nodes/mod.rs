//! Per-node runtime state.
//!
//! Each node kind owns the memory it needs to turn input changes into output
//! changes. Handlers never call user code on retraction: everything needed
//! to undo a tuple's effect is recorded when the tuple is inserted.

mod exists;
mod filter;
mod group;
mod join;
mod score;
mod source;

use scoreforge_core::domain::FactStore;
use scoreforge_core::{Score, Value};
use slotmap::SlotMap;
use smallvec::SmallVec;

use super::definition::{NodeId, NodeKind};
use super::index::BetaMemory;
use super::TupleView;

pub(crate) use exists::ExistsState;
pub(crate) use filter::FilterState;
pub(crate) use group::GroupState;
pub(crate) use join::JoinState;
pub(crate) use score::ScoreState;
pub(crate) use source::SourceState;

slotmap::new_key_type! {
    /// Handle of a live tuple.
    pub(crate) struct TupleKey;
}

pub(crate) type Items = SmallVec<[Value; 4]>;

pub(crate) struct TupleRecord {
    pub(crate) node: NodeId,
    pub(crate) items: Items,
}

pub(crate) type Tuples = SlotMap<TupleKey, TupleRecord>;

/// A change to one tuple, as seen by the node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Change {
    Insert(TupleKey),
    Update(TupleKey),
    Retract(TupleKey),
}

pub(crate) type Changes = SmallVec<[Change; 4]>;

pub(crate) fn view<'a>(tuples: &'a Tuples, store: &'a FactStore, tuple: TupleKey) -> TupleView<'a> {
    let items = tuples.get(tuple).map_or(&[][..], |record| &record.items[..]);
    TupleView::new(store, items)
}

pub(crate) fn items_of(tuples: &Tuples, tuple: TupleKey) -> Items {
    tuples
        .get(tuple)
        .map(|record| record.items.clone())
        .unwrap_or_default()
}

/// Copies the items of `from` into `to`; returns whether they differed.
pub(crate) fn refresh(tuples: &mut Tuples, from: TupleKey, to: TupleKey) -> bool {
    let items = items_of(tuples, from);
    match tuples.get_mut(to) {
        Some(record) if record.items != items => {
            record.items = items;
            true
        }
        _ => false,
    }
}

pub(crate) fn create(tuples: &mut Tuples, node: NodeId, items: Items) -> TupleKey {
    tuples.insert(TupleRecord { node, items })
}

pub(crate) enum NodeState<Sc: Score> {
    Source(SourceState),
    Filter(FilterState),
    Join(JoinState),
    Exists(ExistsState),
    Group(GroupState),
    Score(ScoreState<Sc>),
}

impl<Sc: Score> NodeState<Sc> {
    pub(crate) fn new(kind: &NodeKind) -> Self {
        match kind {
            NodeKind::Source { .. } => NodeState::Source(SourceState::default()),
            NodeKind::Filter(_) => NodeState::Filter(FilterState::default()),
            NodeKind::Join(joiners) => {
                NodeState::Join(JoinState::new(BetaMemory::new(joiners.comparison())))
            }
            NodeKind::Exists { joiners, .. } => {
                NodeState::Exists(ExistsState::new(BetaMemory::new(joiners.comparison())))
            }
            NodeKind::Group { .. } => NodeState::Group(GroupState::default()),
            NodeKind::Score { .. } => NodeState::Score(ScoreState::default()),
        }
    }

    /// Groups currently held, zero for non-group nodes.
    pub(crate) fn group_count(&self) -> usize {
        match self {
            NodeState::Group(state) => state.len(),
            _ => 0,
        }
    }
}
