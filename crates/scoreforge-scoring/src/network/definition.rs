//! Immutable description of a constraint network.
//!
//! A [`NetworkDefinition`] is built once by a
//! [`ConstraintFactory`](crate::stream::ConstraintFactory) and shared
//! read-only by every score director created from the same factory. Nodes
//! are stored parents first, so a node's inputs always have smaller ids.

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use scoreforge_core::domain::{ClassId, SolutionSchema};
use scoreforge_core::{ConstraintRef, ImpactType, Score};
use smallvec::SmallVec;
use tracing::warn;

use super::TupleView;
use crate::api::weight_overrides::ConstraintWeightOverrides;
use crate::stream::collector::Collector;
use crate::stream::joiner::JoinerSet;
use crate::stream::{Mapping, Predicate};

/// Position of a node in its definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which input of a two-input node an edge feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExistenceMode {
    Exists,
    NotExists,
}

impl ExistenceMode {
    /// Whether a left tuple with `partners` matching right tuples is live.
    #[inline]
    pub fn is_live(self, partners: usize) -> bool {
        match self {
            ExistenceMode::Exists => partners > 0,
            ExistenceMode::NotExists => partners == 0,
        }
    }
}

type IntWeightFn = dyn Fn(&TupleView<'_>) -> i64 + Send + Sync;
type DecimalWeightFn = dyn Fn(&TupleView<'_>) -> Decimal + Send + Sync;

/// Multiplier applied to a constraint weight per match.
#[derive(Clone)]
pub enum MatchWeigher {
    Unit,
    Int(Arc<IntWeightFn>),
    Decimal(Arc<DecimalWeightFn>),
}

impl MatchWeigher {
    pub(crate) fn weigh<Sc: Score>(&self, weight: Sc, tuple: &TupleView<'_>) -> Sc {
        match self {
            MatchWeigher::Unit => weight,
            MatchWeigher::Int(f) => weight.multiply(f(tuple)),
            MatchWeigher::Decimal(f) => weight.multiply_decimal(f(tuple)),
        }
    }
}

impl fmt::Debug for MatchWeigher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchWeigher::Unit => f.write_str("Unit"),
            MatchWeigher::Int(_) => f.write_str("Int(..)"),
            MatchWeigher::Decimal(_) => f.write_str("Decimal(..)"),
        }
    }
}

/// What a node does with its input tuples.
#[derive(Clone)]
pub enum NodeKind {
    /// One tuple per fact of `class`; unless `include_unassigned`, entities
    /// with an unassigned required genuine variable are skipped.
    Source {
        class: ClassId,
        include_unassigned: bool,
    },
    Filter(Predicate),
    Join(Arc<JoinerSet>),
    Exists {
        joiners: Arc<JoinerSet>,
        mode: ExistenceMode,
    },
    Group {
        key: Option<Mapping>,
        collectors: Vec<Arc<dyn Collector>>,
    },
    Score {
        constraint: usize,
        weigher: MatchWeigher,
    },
}

impl NodeKind {
    /// Whether two nodes with the same inputs would produce the same tuples.
    pub(crate) fn shares_with(&self, other: &NodeKind) -> bool {
        match (self, other) {
            (
                NodeKind::Source {
                    class: a,
                    include_unassigned: ia,
                },
                NodeKind::Source {
                    class: b,
                    include_unassigned: ib,
                },
            ) => a == b && ia == ib,
            (NodeKind::Filter(a), NodeKind::Filter(b)) => a == b,
            (NodeKind::Join(a), NodeKind::Join(b)) => a == b,
            (
                NodeKind::Exists { joiners: ja, mode: ma },
                NodeKind::Exists { joiners: jb, mode: mb },
            ) => ma == mb && ja == jb,
            (
                NodeKind::Group {
                    key: ka,
                    collectors: ca,
                },
                NodeKind::Group {
                    key: kb,
                    collectors: cb,
                },
            ) => {
                ka == kb
                    && ca.len() == cb.len()
                    && ca.iter().zip(cb).all(|(a, b)| {
                        std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
                    })
            }
            _ => false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Source { .. } => "source",
            NodeKind::Filter(_) => "filter",
            NodeKind::Join(_) => "join",
            NodeKind::Exists {
                mode: ExistenceMode::Exists,
                ..
            } => "exists",
            NodeKind::Exists { .. } => "not-exists",
            NodeKind::Group { .. } => "group",
            NodeKind::Score { .. } => "score",
        }
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One node: its kind, inputs, output arity and children.
#[derive(Debug, Clone)]
pub struct NodeDefinition {
    pub(crate) kind: NodeKind,
    pub(crate) inputs: SmallVec<[NodeId; 2]>,
    pub(crate) arity: usize,
    pub(crate) children: Vec<(NodeId, InputSide)>,
}

impl NodeDefinition {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Arity of the tuples this node emits.
    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn children(&self) -> &[(NodeId, InputSide)] {
        &self.children
    }
}

/// A terminated constraint: its identity, weight and scoring node.
#[derive(Debug, Clone)]
pub struct ConstraintDefinition<Sc: Score> {
    pub(crate) constraint_ref: ConstraintRef,
    pub(crate) weight: Sc,
    pub(crate) impact: ImpactType,
    pub(crate) node: NodeId,
}

impl<Sc: Score> ConstraintDefinition<Sc> {
    pub fn constraint_ref(&self) -> &ConstraintRef {
        &self.constraint_ref
    }

    /// Weight before the impact sign is applied.
    pub fn weight(&self) -> Sc {
        self.weight
    }

    pub fn impact(&self) -> ImpactType {
        self.impact
    }

    /// The node that scores this constraint's matches.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Signed weight of one unit match.
    pub fn signed_weight(&self) -> Sc {
        self.impact.apply(self.weight)
    }
}

/// The complete network: nodes, per-class sources and constraints.
#[derive(Debug, Clone)]
pub struct NetworkDefinition<Sc: Score> {
    pub(crate) schema: Arc<SolutionSchema>,
    pub(crate) nodes: Vec<NodeDefinition>,
    pub(crate) sources: Vec<SmallVec<[NodeId; 2]>>,
    pub(crate) constraints: Vec<ConstraintDefinition<Sc>>,
    pub(crate) shared_nodes: usize,
}

impl<Sc: Score> NetworkDefinition<Sc> {
    pub fn schema(&self) -> &Arc<SolutionSchema> {
        &self.schema
    }

    pub fn nodes(&self) -> &[NodeDefinition] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &NodeDefinition {
        &self.nodes[id.index()]
    }

    /// Source nodes fed by facts of `class`.
    pub fn sources_of(&self, class: ClassId) -> &[NodeId] {
        self.sources.get(class.index()).map(|s| s.as_slice()).unwrap_or(&[])
    }

    pub fn constraints(&self) -> &[ConstraintDefinition<Sc>] {
        &self.constraints
    }

    pub fn constraint(&self, index: usize) -> &ConstraintDefinition<Sc> {
        &self.constraints[index]
    }

    /// Number of node requests answered by an existing node.
    pub fn shared_node_count(&self) -> usize {
        self.shared_nodes
    }

    /// Copy with the weights of overridden constraints replaced.
    ///
    /// Overrides are looked up by full constraint name. Names that match no
    /// constraint are logged and ignored.
    pub fn with_weight_overrides(&self, overrides: &ConstraintWeightOverrides<Sc>) -> Self {
        let mut definition = self.clone();
        for constraint in &mut definition.constraints {
            if let Some(weight) = overrides.get(&constraint.constraint_ref.full_name()) {
                constraint.weight = weight;
            }
        }
        for name in overrides.names() {
            if !self.constraints.iter().any(|c| c.constraint_ref.full_name() == name) {
                warn!(event = "unknown_constraint_weight", constraint = name);
            }
        }
        definition
    }
}
