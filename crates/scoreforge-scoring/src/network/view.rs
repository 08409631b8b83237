//! Read access to a tuple during node evaluation.

use scoreforge_core::domain::{Fact, FactStore, FieldRef};
use scoreforge_core::Value;

static NONE: Value = Value::None;

/// A tuple's elements together with the fact store they refer to.
///
/// Source tuples hold a single [`Value::Ref`] per element, so field reads go
/// through the store and always see the current fact state. Group outputs
/// hold computed values (the key, then one value per collector).
///
/// # Example
///
/// ```
/// use scoreforge_core::Value;
/// use scoreforge_scoring::network::TupleView;
/// use scoreforge_test::Assignment;
///
/// let fixture = Assignment::new();
/// let (solution, entities) = fixture.solution::<scoreforge_core::SimpleScore>(&["v1"], &[Some(0)]);
/// let items = [Value::Ref(entities[0]), Value::Int(3)];
/// let view = TupleView::new(solution.store(), &items);
///
/// assert_eq!(view.arity(), 2);
/// assert_eq!(view.field(0, fixture.weight), &Value::Int(1));
/// assert_eq!(view.get(1), &Value::Int(3));
/// assert!(view.fact(1).is_none());
/// ```
#[derive(Clone, Copy)]
pub struct TupleView<'a> {
    store: &'a FactStore,
    items: &'a [Value],
}

impl<'a> TupleView<'a> {
    pub fn new(store: &'a FactStore, items: &'a [Value]) -> Self {
        Self { store, items }
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.items.len()
    }

    /// Element `index`, or `None` past the end.
    #[inline]
    pub fn get(&self, index: usize) -> &'a Value {
        self.items.get(index).unwrap_or(&NONE)
    }

    /// The fact element `index` refers to, if it is a live fact reference.
    pub fn fact(&self, index: usize) -> Option<&'a Fact> {
        self.store.get(self.get(index).as_ref_id()?)
    }

    /// Reads `field` of the fact at element `index`.
    #[inline]
    pub fn field(&self, index: usize, field: FieldRef) -> &'a Value {
        match self.get(index).as_ref_id() {
            Some(id) => self.store.value(id, field),
            None => &NONE,
        }
    }

    pub fn items(&self) -> &'a [Value] {
        self.items
    }

    pub fn store(&self) -> &'a FactStore {
        self.store
    }
}
