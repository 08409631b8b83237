//! Functions evaluated by network nodes.
//!
//! Node sharing compares these structurally: element and field mappings
//! compare by value, while closures compare by the identity of their `Arc`.
//! Reusing one [`Predicate`] or [`Mapping`] value across constraints lets
//! them share the nodes that evaluate it.

use std::fmt;
use std::sync::Arc;

use scoreforge_core::{FieldRef, Value};

use crate::network::TupleView;

type MapFn = dyn Fn(&TupleView<'_>) -> Value + Send + Sync;
type TestFn = dyn Fn(&TupleView<'_>) -> bool + Send + Sync;
type BiTestFn = dyn Fn(&TupleView<'_>, &TupleView<'_>) -> bool + Send + Sync;

fn same_closure<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Extracts a value from a tuple.
#[derive(Clone)]
pub enum Mapping {
    /// The tuple element itself.
    Item(usize),
    /// A field of the fact at a tuple element.
    Field { item: usize, field: FieldRef },
    Custom(Arc<MapFn>),
}

impl Mapping {
    pub fn item(index: usize) -> Self {
        Mapping::Item(index)
    }

    pub fn field(item: usize, field: FieldRef) -> Self {
        Mapping::Field { item, field }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&TupleView<'_>) -> Value + Send + Sync + 'static,
    {
        Mapping::Custom(Arc::new(f))
    }

    #[inline]
    pub fn apply(&self, tuple: &TupleView<'_>) -> Value {
        match self {
            Mapping::Item(index) => tuple.get(*index).clone(),
            Mapping::Field { item, field } => tuple.field(*item, *field).clone(),
            Mapping::Custom(f) => f(tuple),
        }
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Mapping::Item(a), Mapping::Item(b)) => a == b,
            (
                Mapping::Field { item: ia, field: fa },
                Mapping::Field { item: ib, field: fb },
            ) => ia == ib && fa == fb,
            (Mapping::Custom(a), Mapping::Custom(b)) => same_closure(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mapping::Item(index) => write!(f, "Item({})", index),
            Mapping::Field { item, field } => {
                write!(f, "Field({}, {:?})", item, field)
            }
            Mapping::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A tuple predicate.
#[derive(Clone)]
pub struct Predicate(Arc<TestFn>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&TupleView<'_>) -> bool + Send + Sync + 'static,
    {
        Predicate(Arc::new(f))
    }

    #[inline]
    pub fn test(&self, tuple: &TupleView<'_>) -> bool {
        (self.0)(tuple)
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        same_closure(&self.0, &other.0)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// A predicate over a left and a right tuple.
#[derive(Clone)]
pub struct BiPredicate(Arc<BiTestFn>);

impl BiPredicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&TupleView<'_>, &TupleView<'_>) -> bool + Send + Sync + 'static,
    {
        BiPredicate(Arc::new(f))
    }

    #[inline]
    pub fn test(&self, left: &TupleView<'_>, right: &TupleView<'_>) -> bool {
        (self.0)(left, right)
    }
}

impl PartialEq for BiPredicate {
    fn eq(&self, other: &Self) -> bool {
        same_closure(&self.0, &other.0)
    }
}

impl fmt::Debug for BiPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BiPredicate(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_mappings_compare_by_value() {
        assert_eq!(Mapping::item(0), Mapping::item(0));
        assert_ne!(Mapping::item(0), Mapping::item(1));
    }

    #[test]
    fn test_closures_compare_by_identity() {
        let key = Mapping::custom(|_: &TupleView<'_>| Value::Int(1));
        assert_eq!(key.clone(), key);
        assert_ne!(
            Mapping::custom(|_: &TupleView<'_>| Value::Int(1)),
            Mapping::custom(|_: &TupleView<'_>| Value::Int(1))
        );

        let predicate = Predicate::new(|_: &TupleView<'_>| true);
        assert_eq!(predicate.clone(), predicate);
        assert_ne!(predicate, Predicate::new(|_: &TupleView<'_>| true));
    }
}
