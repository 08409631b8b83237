//! Joiner functions for constraint stream joins.
//!
//! Joiners define matching conditions between a left tuple and a right
//! tuple. Equality and comparison joiners are *indexing* joiners: the join
//! node turns them into a hash key and an ordered range key, so a probe only
//! visits candidate partners. [`filtering`] joiners are evaluated on each
//! candidate after the probe and must come after every indexing joiner.
//!
//! # Example
//!
//! ```
//! use scoreforge_scoring::stream::joiner::{equal, filtering, less_than};
//! use scoreforge_scoring::stream::Mapping;
//! use scoreforge_test::Schedule;
//!
//! let fixture = Schedule::new();
//! // Same employee, left shift starts before the right one ends.
//! let joiners = vec![
//!     equal(Mapping::field(0, fixture.assignee)),
//!     less_than(Mapping::field(0, fixture.start), Mapping::field(0, fixture.end)),
//!     filtering(|left, right| left.get(0) != right.get(0)),
//! ];
//! assert!(joiners[0].is_indexing());
//! assert!(!joiners[2].is_indexing());
//! ```

use std::ops::Bound;

use scoreforge_core::{ConfigurationError, FieldRef, Value};
use smallvec::SmallVec;

use super::mapping::{BiPredicate, Mapping};
use crate::network::TupleView;

/// Ordering a comparison joiner requires of `left` relative to `right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl Comparison {
    #[inline]
    pub fn holds(self, left: &Value, right: &Value) -> bool {
        match self {
            Comparison::LessThan => left < right,
            Comparison::LessThanOrEqual => left <= right,
            Comparison::GreaterThan => left > right,
            Comparison::GreaterThanOrEqual => left >= right,
        }
    }

    /// Range of right values matching a left value.
    pub(crate) fn right_bounds(self, left: &Value) -> (Bound<&Value>, Bound<&Value>) {
        match self {
            Comparison::LessThan => (Bound::Excluded(left), Bound::Unbounded),
            Comparison::LessThanOrEqual => (Bound::Included(left), Bound::Unbounded),
            Comparison::GreaterThan => (Bound::Unbounded, Bound::Excluded(left)),
            Comparison::GreaterThanOrEqual => (Bound::Unbounded, Bound::Included(left)),
        }
    }

    /// Range of left values matching a right value.
    pub(crate) fn left_bounds(self, right: &Value) -> (Bound<&Value>, Bound<&Value>) {
        match self {
            Comparison::LessThan => (Bound::Unbounded, Bound::Excluded(right)),
            Comparison::LessThanOrEqual => (Bound::Unbounded, Bound::Included(right)),
            Comparison::GreaterThan => (Bound::Excluded(right), Bound::Unbounded),
            Comparison::GreaterThanOrEqual => (Bound::Included(right), Bound::Unbounded),
        }
    }
}

/// One matching condition between a left and a right tuple.
#[derive(Debug, Clone, PartialEq)]
pub enum Joiner {
    Equal { left: Mapping, right: Mapping },
    Compare {
        left: Mapping,
        right: Mapping,
        comparison: Comparison,
    },
    Filtering(BiPredicate),
}

impl Joiner {
    /// Whether the join node can use this joiner as an index key.
    pub fn is_indexing(&self) -> bool {
        !matches!(self, Joiner::Filtering(_))
    }

    pub fn matches(&self, left: &TupleView<'_>, right: &TupleView<'_>) -> bool {
        match self {
            Joiner::Equal { left: l, right: r } => l.apply(left) == r.apply(right),
            Joiner::Compare {
                left: l,
                right: r,
                comparison,
            } => comparison.holds(&l.apply(left), &r.apply(right)),
            Joiner::Filtering(predicate) => predicate.test(left, right),
        }
    }
}

/// Same mapping on both sides.
pub fn equal(mapping: Mapping) -> Joiner {
    Joiner::Equal {
        left: mapping.clone(),
        right: mapping,
    }
}

pub fn equal_on(left: Mapping, right: Mapping) -> Joiner {
    Joiner::Equal { left, right }
}

/// Field of the first left element equals a field of the first right element.
pub fn equal_fields(left: FieldRef, right: FieldRef) -> Joiner {
    Joiner::Equal {
        left: Mapping::field(0, left),
        right: Mapping::field(0, right),
    }
}

fn compare(left: Mapping, right: Mapping, comparison: Comparison) -> Joiner {
    Joiner::Compare {
        left,
        right,
        comparison,
    }
}

pub fn less_than(left: Mapping, right: Mapping) -> Joiner {
    compare(left, right, Comparison::LessThan)
}

pub fn less_than_or_equal(left: Mapping, right: Mapping) -> Joiner {
    compare(left, right, Comparison::LessThanOrEqual)
}

pub fn greater_than(left: Mapping, right: Mapping) -> Joiner {
    compare(left, right, Comparison::GreaterThan)
}

pub fn greater_than_or_equal(left: Mapping, right: Mapping) -> Joiner {
    compare(left, right, Comparison::GreaterThanOrEqual)
}

pub fn filtering<F>(f: F) -> Joiner
where
    F: Fn(&TupleView<'_>, &TupleView<'_>) -> bool + Send + Sync + 'static,
{
    Joiner::Filtering(BiPredicate::new(f))
}

pub(crate) type IndexKey = SmallVec<[Value; 2]>;

/// Joiners compiled for a join or existence node.
///
/// Every equality joiner contributes to the hash key. The first comparison
/// becomes the ordered range key. Later comparisons and filtering joiners
/// are checked on each probed candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinerSet {
    joiners: Vec<Joiner>,
    equal: SmallVec<[usize; 2]>,
    range: Option<usize>,
    post: SmallVec<[usize; 2]>,
}

impl JoinerSet {
    pub fn compile(joiners: Vec<Joiner>) -> Result<Self, ConfigurationError> {
        if let Some(filtering) = joiners.iter().position(|j| !j.is_indexing()) {
            if let Some(offset) = joiners[filtering..].iter().position(Joiner::is_indexing) {
                return Err(ConfigurationError::JoinerOrder {
                    filtering,
                    indexing: filtering + offset,
                });
            }
        }

        let mut equal = SmallVec::new();
        let mut range = None;
        let mut post = SmallVec::new();
        for (i, joiner) in joiners.iter().enumerate() {
            match joiner {
                Joiner::Equal { .. } => equal.push(i),
                Joiner::Compare { .. } if range.is_none() => range = Some(i),
                _ => post.push(i),
            }
        }
        Ok(Self {
            joiners,
            equal,
            range,
            post,
        })
    }

    pub fn len(&self) -> usize {
        self.joiners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joiners.is_empty()
    }

    pub(crate) fn left_key(&self, tuple: &TupleView<'_>) -> IndexKey {
        self.equal
            .iter()
            .map(|&i| match &self.joiners[i] {
                Joiner::Equal { left, .. } => left.apply(tuple),
                _ => Value::None,
            })
            .collect()
    }

    pub(crate) fn right_key(&self, tuple: &TupleView<'_>) -> IndexKey {
        self.equal
            .iter()
            .map(|&i| match &self.joiners[i] {
                Joiner::Equal { right, .. } => right.apply(tuple),
                _ => Value::None,
            })
            .collect()
    }

    fn range_joiner(&self) -> Option<(&Mapping, &Mapping, Comparison)> {
        match self.joiners.get(self.range?)? {
            Joiner::Compare {
                left,
                right,
                comparison,
            } => Some((left, right, *comparison)),
            _ => None,
        }
    }

    pub(crate) fn left_range(&self, tuple: &TupleView<'_>) -> Value {
        self.range_joiner()
            .map_or(Value::None, |(left, _, _)| left.apply(tuple))
    }

    pub(crate) fn right_range(&self, tuple: &TupleView<'_>) -> Value {
        self.range_joiner()
            .map_or(Value::None, |(_, right, _)| right.apply(tuple))
    }

    pub(crate) fn comparison(&self) -> Option<Comparison> {
        self.range_joiner().map(|(_, _, comparison)| comparison)
    }

    /// Joiners not covered by the index.
    #[inline]
    pub(crate) fn post_matches(&self, left: &TupleView<'_>, right: &TupleView<'_>) -> bool {
        self.post.iter().all(|&i| self.joiners[i].matches(left, right))
    }
}
