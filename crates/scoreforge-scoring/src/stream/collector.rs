//! Collectors for grouping and aggregating tuples.
//!
//! A [`Collector`] maps each grouped tuple to a value and creates one
//! [`Accumulator`] per group. Accumulating returns an [`Undo`] token that the
//! group node stores with the tuple; retracting the tuple hands the token
//! back, so a retraction never re-evaluates the mapping.
//!
//! # Example
//!
//! ```
//! use scoreforge_core::Value;
//! use scoreforge_scoring::stream::collector::{sum, Collector};
//! use scoreforge_scoring::stream::Mapping;
//!
//! let collector = sum(Mapping::item(0));
//! let mut acc = collector.create_accumulator();
//! let a = acc.accumulate(Value::Int(3));
//! let _b = acc.accumulate(Value::Int(4));
//! assert_eq!(acc.result(), Value::Int(7));
//! acc.undo(a);
//! assert_eq!(acc.result(), Value::Int(4));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use scoreforge_core::Value;

use super::mapping::Mapping;
use crate::network::TupleView;

/// Token returned by [`Accumulator::accumulate`] that reverts that call.
#[derive(Debug, Clone, PartialEq)]
pub struct Undo(Value);

impl Undo {
    pub fn new(value: Value) -> Self {
        Undo(value)
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Per-group fold state.
pub trait Accumulator: Send {
    fn accumulate(&mut self, value: Value) -> Undo;

    /// Reverts one earlier [`accumulate`](Accumulator::accumulate) call.
    fn undo(&mut self, undo: Undo);

    fn result(&self) -> Value;
}

/// Aggregation specification of a group node.
///
/// Group nodes compare collectors by `Arc` identity when deciding whether
/// two groupings can share a node.
pub trait Collector: Send + Sync {
    fn map(&self, tuple: &TupleView<'_>) -> Value;

    fn create_accumulator(&self) -> Box<dyn Accumulator>;
}

/// Counts grouped tuples.
pub fn count() -> Arc<dyn Collector> {
    Arc::new(CountCollector)
}

/// Counts distinct mapped values.
pub fn count_distinct(mapping: Mapping) -> Arc<dyn Collector> {
    Arc::new(Mapped {
        mapping,
        kind: Kind::CountDistinct,
    })
}

/// Sums mapped numbers; `None` values are skipped.
pub fn sum(mapping: Mapping) -> Arc<dyn Collector> {
    Arc::new(Mapped {
        mapping,
        kind: Kind::Sum,
    })
}

pub fn min(mapping: Mapping) -> Arc<dyn Collector> {
    Arc::new(Mapped {
        mapping,
        kind: Kind::Min,
    })
}

pub fn max(mapping: Mapping) -> Arc<dyn Collector> {
    Arc::new(Mapped {
        mapping,
        kind: Kind::Max,
    })
}

/// Mean of mapped numbers as a decimal, or a float if any input is a float.
pub fn average(mapping: Mapping) -> Arc<dyn Collector> {
    Arc::new(Mapped {
        mapping,
        kind: Kind::Average,
    })
}

/// Mapped values as a sorted list, duplicates included.
pub fn to_list(mapping: Mapping) -> Arc<dyn Collector> {
    Arc::new(Mapped {
        mapping,
        kind: Kind::ToList,
    })
}

struct CountCollector;

impl Collector for CountCollector {
    fn map(&self, _tuple: &TupleView<'_>) -> Value {
        Value::None
    }

    fn create_accumulator(&self) -> Box<dyn Accumulator> {
        Box::new(CountAccumulator(0))
    }
}

struct CountAccumulator(i64);

impl Accumulator for CountAccumulator {
    fn accumulate(&mut self, _value: Value) -> Undo {
        self.0 += 1;
        Undo(Value::None)
    }

    fn undo(&mut self, _undo: Undo) {
        self.0 -= 1;
    }

    fn result(&self) -> Value {
        Value::Int(self.0)
    }
}

#[derive(Clone, Copy)]
enum Kind {
    CountDistinct,
    Sum,
    Min,
    Max,
    Average,
    ToList,
}

struct Mapped {
    mapping: Mapping,
    kind: Kind,
}

impl Collector for Mapped {
    fn map(&self, tuple: &TupleView<'_>) -> Value {
        self.mapping.apply(tuple)
    }

    fn create_accumulator(&self) -> Box<dyn Accumulator> {
        match self.kind {
            Kind::CountDistinct => Box::new(DistinctAccumulator::default()),
            Kind::Sum => Box::new(SumAccumulator::default()),
            Kind::Average => Box::new(AverageAccumulator::default()),
            Kind::Min => Box::new(MultisetAccumulator::new(Extract::Min)),
            Kind::Max => Box::new(MultisetAccumulator::new(Extract::Max)),
            Kind::ToList => Box::new(MultisetAccumulator::new(Extract::List)),
        }
    }
}

#[derive(Default)]
struct DistinctAccumulator {
    counts: HashMap<Value, usize>,
}

impl Accumulator for DistinctAccumulator {
    fn accumulate(&mut self, value: Value) -> Undo {
        *self.counts.entry(value.clone()).or_default() += 1;
        Undo(value)
    }

    fn undo(&mut self, undo: Undo) {
        if let Some(count) = self.counts.get_mut(&undo.0) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&undo.0);
            }
        }
    }

    fn result(&self) -> Value {
        Value::Int(self.counts.len() as i64)
    }
}

/// Running sum kept per numeric kind so any sequence of accumulate and undo
/// calls yields the same result as summing the remaining values afresh.
///
/// Integers are totalled in `i128` and reported saturated to `i64`. Floats
/// are kept as a multiset and summed in bit order when read.
#[derive(Default)]
struct Sum {
    int: i128,
    decimal: Decimal,
    floats: BTreeMap<u64, usize>,
    decimals: usize,
    count: usize,
}

impl Sum {
    fn add(&mut self, value: &Value, sign: i64) {
        match value {
            Value::Int(v) => self.int += i128::from(*v) * i128::from(sign),
            Value::Decimal(v) => {
                self.decimal += *v * Decimal::from(sign);
                self.decimals = add_signed(self.decimals, sign);
            }
            Value::Float(v) => {
                let bits = v.to_bits();
                if sign < 0 {
                    if let Some(n) = self.floats.get_mut(&bits) {
                        *n -= 1;
                        if *n == 0 {
                            self.floats.remove(&bits);
                        }
                    }
                } else {
                    *self.floats.entry(bits).or_default() += 1;
                }
            }
            _ => return,
        }
        self.count = add_signed(self.count, sign);
    }

    fn int(&self) -> i64 {
        i64::try_from(self.int).unwrap_or(if self.int < 0 { i64::MIN } else { i64::MAX })
    }

    fn value(&self) -> Value {
        if !self.floats.is_empty() {
            let floats: f64 = self
                .floats
                .iter()
                .map(|(&bits, &n)| f64::from_bits(bits) * n as f64)
                .sum();
            let rest = self.decimal.to_f64().unwrap_or(0.0);
            Value::Float(self.int as f64 + rest + floats)
        } else if self.decimals > 0 {
            Value::Decimal(self.decimal + Decimal::from(self.int()))
        } else {
            Value::Int(self.int())
        }
    }
}

fn add_signed(n: usize, sign: i64) -> usize {
    if sign < 0 {
        n.saturating_sub(1)
    } else {
        n + 1
    }
}

#[derive(Default)]
struct SumAccumulator(Sum);

impl Accumulator for SumAccumulator {
    fn accumulate(&mut self, value: Value) -> Undo {
        self.0.add(&value, 1);
        Undo(value)
    }

    fn undo(&mut self, undo: Undo) {
        self.0.add(&undo.0, -1);
    }

    fn result(&self) -> Value {
        self.0.value()
    }
}

#[derive(Default)]
struct AverageAccumulator(Sum);

impl Accumulator for AverageAccumulator {
    fn accumulate(&mut self, value: Value) -> Undo {
        self.0.add(&value, 1);
        Undo(value)
    }

    fn undo(&mut self, undo: Undo) {
        self.0.add(&undo.0, -1);
    }

    fn result(&self) -> Value {
        let count = self.0.count;
        if count == 0 {
            return Value::None;
        }
        match self.0.value() {
            Value::Float(total) => Value::Float(total / count as f64),
            Value::Decimal(total) => total
                .checked_div(Decimal::from(count))
                .map_or(Value::None, Value::Decimal),
            Value::Int(total) => Decimal::from(total)
                .checked_div(Decimal::from(count))
                .map_or(Value::None, Value::Decimal),
            _ => Value::None,
        }
    }
}

#[derive(Clone, Copy)]
enum Extract {
    Min,
    Max,
    List,
}

/// Ordered multiset of values, for min, max and list results.
struct MultisetAccumulator {
    values: BTreeMap<Value, usize>,
    extract: Extract,
}

impl MultisetAccumulator {
    fn new(extract: Extract) -> Self {
        Self {
            values: BTreeMap::new(),
            extract,
        }
    }
}

impl Accumulator for MultisetAccumulator {
    fn accumulate(&mut self, value: Value) -> Undo {
        if value.is_none() && !matches!(self.extract, Extract::List) {
            return Undo(Value::None);
        }
        *self.values.entry(value.clone()).or_default() += 1;
        Undo(value)
    }

    fn undo(&mut self, undo: Undo) {
        if let Some(count) = self.values.get_mut(&undo.0) {
            *count -= 1;
            if *count == 0 {
                self.values.remove(&undo.0);
            }
        }
    }

    fn result(&self) -> Value {
        match self.extract {
            Extract::Min => self.values.keys().next().cloned().unwrap_or_default(),
            Extract::Max => self.values.keys().next_back().cloned().unwrap_or_default(),
            Extract::List => Value::list(
                self.values
                    .iter()
                    .flat_map(|(value, &n)| std::iter::repeat(value.clone()).take(n)),
            ),
        }
    }
}
