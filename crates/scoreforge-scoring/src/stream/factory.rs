// Constraint factory: the entry point of the fluent stream API.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use scoreforge_core::domain::SolutionSchema;
use scoreforge_core::{ConfigurationError, FieldRef, Score};

use super::joiner::{less_than, Joiner, JoinerSet};
use super::mapping::Mapping;
use super::tuple_stream::Stream;
use crate::network::builder::NetworkBuilder;
use crate::network::{NetworkDefinition, NodeKind};

/// Builds a [`NetworkDefinition`] from fluent constraint streams.
///
/// Every stream created from one factory feeds the same network, so
/// identical stream prefixes share nodes. Definition errors are collected
/// and returned by [`build`](ConstraintFactory::build).
///
/// # Example
///
/// ```
/// use scoreforge_core::SimpleScore;
/// use scoreforge_scoring::stream::joiner::equal;
/// use scoreforge_scoring::stream::{ConstraintFactory, Mapping};
/// use scoreforge_test::Assignment;
///
/// let fixture = Assignment::new();
/// let network = ConstraintFactory::<SimpleScore>::define(fixture.schema.clone(), |factory| {
///     factory
///         .for_each_unique_pair("Entity", [equal(Mapping::field(0, fixture.value))])
///         .penalize(SimpleScore::ONE)
///         .as_constraint("Same value");
/// })
/// .unwrap();
/// assert_eq!(network.constraints().len(), 1);
/// ```
pub struct ConstraintFactory<Sc: Score> {
    builder: Rc<RefCell<NetworkBuilder<Sc>>>,
}

impl<Sc: Score> ConstraintFactory<Sc> {
    pub fn new(schema: Arc<SolutionSchema>) -> Self {
        Self {
            builder: Rc::new(RefCell::new(NetworkBuilder::new(schema))),
        }
    }

    /// Runs `define` against a fresh factory and builds the network.
    pub fn define<F>(
        schema: Arc<SolutionSchema>,
        define: F,
    ) -> Result<NetworkDefinition<Sc>, ConfigurationError>
    where
        F: FnOnce(&ConstraintFactory<Sc>),
    {
        let factory = Self::new(schema);
        define(&factory);
        factory.build()
    }

    /// Package used by [`as_constraint`](super::ConstraintBuilder::as_constraint).
    pub fn with_package(self, package: &str) -> Self {
        self.builder.borrow_mut().set_package(package.to_string());
        self
    }

    pub fn schema(&self) -> Arc<SolutionSchema> {
        Arc::clone(self.builder.borrow().schema())
    }

    pub fn field(&self, class: &str, field: &str) -> Result<FieldRef, ConfigurationError> {
        self.builder.borrow().schema().field_ref(class, field)
    }

    /// Every fact of `class`; entities with an unassigned required
    /// variable are skipped.
    pub fn for_each(&self, class: &str) -> Stream<Sc> {
        self.source(class, false)
    }

    pub fn for_each_including_unassigned(&self, class: &str) -> Stream<Sc> {
        self.source(class, true)
    }

    /// Every unordered pair of distinct facts of `class` matching `joiners`.
    pub fn for_each_unique_pair(
        &self,
        class: &str,
        joiners: impl IntoIterator<Item = Joiner>,
    ) -> Stream<Sc> {
        let mut all = vec![less_than(Mapping::item(0), Mapping::item(0))];
        all.extend(joiners);
        let result = {
            let mut builder = self.builder.borrow_mut();
            let made = builder.source(class, false).and_then(|source| {
                let joiners = JoinerSet::compile(all)?;
                builder.node(NodeKind::Join(Arc::new(joiners)), &[source, source], 2)
            });
            match made {
                Ok(node) => Some(node),
                Err(error) => {
                    builder.record(error);
                    None
                }
            }
        };
        Stream::new(Rc::clone(&self.builder), result, 2)
    }

    fn source(&self, class: &str, include_unassigned: bool) -> Stream<Sc> {
        let node = {
            let mut builder = self.builder.borrow_mut();
            match builder.source(class, include_unassigned) {
                Ok(node) => Some(node),
                Err(error) => {
                    builder.record(error);
                    None
                }
            }
        };
        Stream::new(Rc::clone(&self.builder), node, 1)
    }

    pub fn build(self) -> Result<NetworkDefinition<Sc>, ConfigurationError> {
        let schema = self.schema();
        let builder = self.builder.replace(NetworkBuilder::new(schema));
        builder.build()
    }
}
