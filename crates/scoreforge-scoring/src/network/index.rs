//! Indexes for two-input nodes.
//!
//! Each side keeps its tuples in a hash index keyed by the equality joiner
//! values, each bucket ordered by the comparison joiner value. A probe from
//! one side visits only the other side's bucket for the same key, limited to
//! the range the comparison allows.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;

use scoreforge_core::Value;

use super::nodes::TupleKey;
use crate::network::definition::InputSide;
use crate::stream::joiner::{Comparison, IndexKey};

type Range<'a> = (Bound<&'a Value>, Bound<&'a Value>);

const FULL: Range<'static> = (Bound::Unbounded, Bound::Unbounded);

#[derive(Default)]
pub(crate) struct SideIndex {
    buckets: HashMap<IndexKey, BTreeMap<Value, HashSet<TupleKey>>>,
}

impl SideIndex {
    fn put(&mut self, key: IndexKey, range: Value, tuple: TupleKey) {
        self.buckets
            .entry(key)
            .or_default()
            .entry(range)
            .or_default()
            .insert(tuple);
    }

    fn remove(&mut self, key: &IndexKey, range: &Value, tuple: TupleKey) {
        let Some(bucket) = self.buckets.get_mut(key) else {
            return;
        };
        if let Some(tuples) = bucket.get_mut(range) {
            tuples.remove(&tuple);
            if tuples.is_empty() {
                bucket.remove(range);
            }
        }
        if bucket.is_empty() {
            self.buckets.remove(key);
        }
    }

    fn probe<'s>(&'s self, key: &IndexKey, range: Range<'s>) -> impl Iterator<Item = TupleKey> + 's {
        self.buckets
            .get(key)
            .into_iter()
            .flat_map(move |bucket| bucket.range::<Value, _>(range).flat_map(|(_, t)| t.iter().copied()))
    }
}

pub(crate) struct BetaEntry {
    eq: IndexKey,
    range: Value,
    partners: HashSet<TupleKey>,
}

/// Partner sets after an update, relative to before it.
#[derive(Default)]
pub(crate) struct PartnerDiff {
    pub(crate) removed: Vec<TupleKey>,
    pub(crate) added: Vec<TupleKey>,
    pub(crate) kept: Vec<TupleKey>,
}

/// Left and right memories of a join or existence node.
///
/// Every entry records its index keys and its current partners on the other
/// side, so a retraction removes exactly the pairs it created without
/// evaluating any joiner.
pub(crate) struct BetaMemory {
    comparison: Option<Comparison>,
    left: HashMap<TupleKey, BetaEntry>,
    right: HashMap<TupleKey, BetaEntry>,
    left_index: SideIndex,
    right_index: SideIndex,
}

impl BetaMemory {
    pub(crate) fn new(comparison: Option<Comparison>) -> Self {
        Self {
            comparison,
            left: HashMap::new(),
            right: HashMap::new(),
            left_index: SideIndex::default(),
            right_index: SideIndex::default(),
        }
    }

    /// Candidates on the opposite side for an entry with these keys.
    fn candidates(&self, side: InputSide, eq: &IndexKey, range: &Value) -> Vec<TupleKey> {
        match side {
            InputSide::Left => {
                let bounds = self.comparison.map_or(FULL, |c| c.right_bounds(range));
                self.right_index.probe(eq, bounds).collect()
            }
            InputSide::Right => {
                let bounds = self.comparison.map_or(FULL, |c| c.left_bounds(range));
                self.left_index.probe(eq, bounds).collect()
            }
        }
    }

    /// Stores `tuple` and links it with every accepted candidate.
    pub(crate) fn insert<F>(
        &mut self,
        side: InputSide,
        tuple: TupleKey,
        eq: IndexKey,
        range: Value,
        mut accept: F,
    ) -> Vec<TupleKey>
    where
        F: FnMut(TupleKey) -> bool,
    {
        let partners: Vec<TupleKey> = self
            .candidates(side, &eq, &range)
            .into_iter()
            .filter(|&other| accept(other))
            .collect();

        let (own, own_index, others) = match side {
            InputSide::Left => (&mut self.left, &mut self.left_index, &mut self.right),
            InputSide::Right => (&mut self.right, &mut self.right_index, &mut self.left),
        };
        for partner in &partners {
            if let Some(entry) = others.get_mut(partner) {
                entry.partners.insert(tuple);
            }
        }
        own_index.put(eq.clone(), range.clone(), tuple);
        own.insert(
            tuple,
            BetaEntry {
                eq,
                range,
                partners: partners.iter().copied().collect(),
            },
        );
        partners
    }

    /// Forgets `tuple` and returns the partners it was linked with.
    pub(crate) fn retract(&mut self, side: InputSide, tuple: TupleKey) -> Vec<TupleKey> {
        let (own, own_index, others) = match side {
            InputSide::Left => (&mut self.left, &mut self.left_index, &mut self.right),
            InputSide::Right => (&mut self.right, &mut self.right_index, &mut self.left),
        };
        let Some(entry) = own.remove(&tuple) else {
            return Vec::new();
        };
        own_index.remove(&entry.eq, &entry.range, tuple);
        for partner in &entry.partners {
            if let Some(other) = others.get_mut(partner) {
                other.partners.remove(&tuple);
            }
        }
        entry.partners.into_iter().collect()
    }

    /// Re-links `tuple` under new keys.
    pub(crate) fn update<F>(
        &mut self,
        side: InputSide,
        tuple: TupleKey,
        eq: IndexKey,
        range: Value,
        accept: F,
    ) -> PartnerDiff
    where
        F: FnMut(TupleKey) -> bool,
    {
        let before: HashSet<TupleKey> = self.retract(side, tuple).into_iter().collect();
        let after = self.insert(side, tuple, eq, range, accept);
        let mut diff = PartnerDiff::default();
        for partner in &after {
            if before.contains(partner) {
                diff.kept.push(*partner);
            } else {
                diff.added.push(*partner);
            }
        }
        let after: HashSet<TupleKey> = after.into_iter().collect();
        diff.removed = before.into_iter().filter(|p| !after.contains(p)).collect();
        diff
    }

    /// Number of right partners of a left tuple.
    pub(crate) fn left_partner_count(&self, tuple: TupleKey) -> usize {
        self.left.get(&tuple).map_or(0, |entry| entry.partners.len())
    }

    pub(crate) fn contains(&self, side: InputSide, tuple: TupleKey) -> bool {
        match side {
            InputSide::Left => self.left.contains_key(&tuple),
            InputSide::Right => self.right.contains_key(&tuple),
        }
    }
}
