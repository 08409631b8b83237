// Fluent constraint stream over tuples of arity 1 to 4.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use rust_decimal::Decimal;
use scoreforge_core::{ConfigurationError, ConstraintRef, ImpactType, Score};

use super::collector::Collector;
use super::joiner::{Joiner, JoinerSet};
use super::mapping::{Mapping, Predicate};
use crate::network::builder::NetworkBuilder;
use crate::network::{ExistenceMode, MatchWeigher, NodeId, NodeKind, TupleView};

/// A stream of tuples flowing out of one network node.
///
/// Streams are consumed by each operation. Once an operation fails, the
/// error is recorded in the factory and the rest of the chain is inert.
#[must_use = "streams do nothing unless terminated with a constraint"]
pub struct Stream<Sc: Score> {
    builder: Rc<RefCell<NetworkBuilder<Sc>>>,
    node: Option<NodeId>,
    arity: usize,
}

impl<Sc: Score> Stream<Sc> {
    pub(crate) fn new(builder: Rc<RefCell<NetworkBuilder<Sc>>>, node: Option<NodeId>, arity: usize) -> Self {
        Self {
            builder,
            node,
            arity,
        }
    }

    /// Number of elements in each tuple of this stream.
    pub fn arity(&self) -> usize {
        self.arity
    }

    fn derive<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut NetworkBuilder<Sc>, NodeId, usize) -> Result<(NodeId, usize), ConfigurationError>,
    {
        let next = match self.node {
            Some(node) => {
                let mut builder = self.builder.borrow_mut();
                match f(&mut builder, node, self.arity) {
                    Ok(next) => Some(next),
                    Err(error) => {
                        builder.record(error);
                        None
                    }
                }
            }
            None => None,
        };
        Stream {
            arity: next.map_or(self.arity, |(_, arity)| arity),
            node: next.map(|(node, _)| node),
            builder: self.builder,
        }
    }

    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&TupleView<'_>) -> bool + Send + Sync + 'static,
    {
        self.filter_with(&Predicate::new(predicate))
    }

    /// Filters with a predicate that other streams may reuse; streams
    /// filtering the same input with the same predicate share one node.
    pub fn filter_with(self, predicate: &Predicate) -> Self {
        let predicate = predicate.clone();
        self.derive(|builder, node, arity| {
            let id = builder.node(NodeKind::Filter(predicate), &[node], arity)?;
            Ok((id, arity))
        })
    }

    /// Joins every fact of `class` matching `joiners`, appending it to the tuple.
    pub fn join(self, class: &str, joiners: impl IntoIterator<Item = Joiner>) -> Self {
        let joiners: Vec<Joiner> = joiners.into_iter().collect();
        let class = class.to_string();
        self.derive(move |builder, node, arity| {
            let right = builder.source(&class, false)?;
            let joiners = JoinerSet::compile(joiners)?;
            let id = builder.node(NodeKind::Join(Arc::new(joiners)), &[node, right], arity + 1)?;
            Ok((id, arity + 1))
        })
    }

    /// Joins the tuples of another stream from the same factory.
    pub fn join_stream(self, other: Stream<Sc>, joiners: impl IntoIterator<Item = Joiner>) -> Self {
        let joiners: Vec<Joiner> = joiners.into_iter().collect();
        let (right, right_arity) = (other.node, other.arity);
        self.derive(move |builder, node, arity| {
            let Some(right) = right else {
                return Err(ConfigurationError::UnterminatedStream);
            };
            let joiners = JoinerSet::compile(joiners)?;
            let out = arity + right_arity;
            let id = builder.node(NodeKind::Join(Arc::new(joiners)), &[node, right], out)?;
            Ok((id, out))
        })
    }

    fn existence(self, class: &str, mut joiners: Vec<Joiner>, mode: ExistenceMode, other: bool) -> Self {
        let class = class.to_string();
        self.derive(move |builder, node, arity| {
            if other {
                joiners.push(builder.different_fact());
            }
            let right = builder.source(&class, false)?;
            let joiners = Arc::new(JoinerSet::compile(joiners)?);
            let id = builder.node(NodeKind::Exists { joiners, mode }, &[node, right], arity)?;
            Ok((id, arity))
        })
    }

    /// Keeps tuples for which some fact of `class` matches `joiners`.
    pub fn if_exists(self, class: &str, joiners: impl IntoIterator<Item = Joiner>) -> Self {
        self.existence(class, joiners.into_iter().collect(), ExistenceMode::Exists, false)
    }

    /// Keeps tuples for which no fact of `class` matches `joiners`.
    pub fn if_not_exists(self, class: &str, joiners: impl IntoIterator<Item = Joiner>) -> Self {
        self.existence(class, joiners.into_iter().collect(), ExistenceMode::NotExists, false)
    }

    /// Like [`if_exists`](Stream::if_exists), ignoring the tuple's own first fact.
    pub fn if_exists_other(self, class: &str, joiners: impl IntoIterator<Item = Joiner>) -> Self {
        self.existence(class, joiners.into_iter().collect(), ExistenceMode::Exists, true)
    }

    pub fn if_not_exists_other(self, class: &str, joiners: impl IntoIterator<Item = Joiner>) -> Self {
        self.existence(class, joiners.into_iter().collect(), ExistenceMode::NotExists, true)
    }

    /// One tuple `(key)` per distinct key.
    pub fn group_by(self, key: Mapping) -> Self {
        self.group_by_collectors(Some(key), Vec::new())
    }

    /// One tuple `(key, result)` per distinct key.
    pub fn group_by_collect(self, key: Mapping, collector: Arc<dyn Collector>) -> Self {
        self.group_by_collectors(Some(key), vec![collector])
    }

    /// One tuple per distinct key holding the key (if any) followed by each
    /// collector result. Without a key, all tuples fall into one group.
    pub fn group_by_collectors(self, key: Option<Mapping>, collectors: Vec<Arc<dyn Collector>>) -> Self {
        let out = usize::from(key.is_some()) + collectors.len();
        self.derive(move |builder, node, _| {
            let id = builder.node(NodeKind::Group { key, collectors }, &[node], out)?;
            Ok((id, out))
        })
    }

    fn terminal(self, weight: Sc, impact: ImpactType, weigher: MatchWeigher) -> ConstraintBuilder<Sc> {
        ConstraintBuilder {
            stream: self,
            weight,
            impact,
            weigher,
            terminated: false,
        }
    }

    pub fn penalize(self, weight: Sc) -> ConstraintBuilder<Sc> {
        self.terminal(weight, ImpactType::Penalty, MatchWeigher::Unit)
    }

    pub fn reward(self, weight: Sc) -> ConstraintBuilder<Sc> {
        self.terminal(weight, ImpactType::Reward, MatchWeigher::Unit)
    }

    /// Penalizes `weight` times an integer match weight.
    pub fn penalize_with<F>(self, weight: Sc, match_weight: F) -> ConstraintBuilder<Sc>
    where
        F: Fn(&TupleView<'_>) -> i64 + Send + Sync + 'static,
    {
        self.terminal(weight, ImpactType::Penalty, MatchWeigher::Int(Arc::new(match_weight)))
    }

    pub fn reward_with<F>(self, weight: Sc, match_weight: F) -> ConstraintBuilder<Sc>
    where
        F: Fn(&TupleView<'_>) -> i64 + Send + Sync + 'static,
    {
        self.terminal(weight, ImpactType::Reward, MatchWeigher::Int(Arc::new(match_weight)))
    }

    /// Penalizes `weight` times a decimal match weight.
    pub fn penalize_decimal<F>(self, weight: Sc, match_weight: F) -> ConstraintBuilder<Sc>
    where
        F: Fn(&TupleView<'_>) -> Decimal + Send + Sync + 'static,
    {
        self.terminal(weight, ImpactType::Penalty, MatchWeigher::Decimal(Arc::new(match_weight)))
    }

    pub fn reward_decimal<F>(self, weight: Sc, match_weight: F) -> ConstraintBuilder<Sc>
    where
        F: Fn(&TupleView<'_>) -> Decimal + Send + Sync + 'static,
    {
        self.terminal(weight, ImpactType::Reward, MatchWeigher::Decimal(Arc::new(match_weight)))
    }
}

/// A scored stream waiting for its constraint name.
///
/// Dropping it without calling [`as_constraint`](ConstraintBuilder::as_constraint)
/// makes the factory's `build` fail.
#[must_use = "a constraint is only registered by as_constraint"]
pub struct ConstraintBuilder<Sc: Score> {
    stream: Stream<Sc>,
    weight: Sc,
    impact: ImpactType,
    weigher: MatchWeigher,
    terminated: bool,
}

impl<Sc: Score> ConstraintBuilder<Sc> {
    /// Registers the constraint in the factory's package.
    pub fn as_constraint(self, name: &str) {
        let package = self.stream.builder.borrow().package().to_string();
        self.as_constraint_in(&package, name);
    }

    pub fn as_constraint_in(mut self, package: &str, name: &str) {
        self.terminated = true;
        let Some(node) = self.stream.node else {
            return;
        };
        let mut builder = self.stream.builder.borrow_mut();
        let registered = builder.constraint(
            ConstraintRef::new(package, name),
            self.weight,
            self.impact,
            self.weigher.clone(),
            node,
        );
        if let Err(error) = registered {
            builder.record(error);
        }
    }
}

impl<Sc: Score> Drop for ConstraintBuilder<Sc> {
    fn drop(&mut self) {
        if !self.terminated {
            if let Ok(mut builder) = self.stream.builder.try_borrow_mut() {
                builder.record(ConfigurationError::UnterminatedStream);
            }
        }
    }
}
