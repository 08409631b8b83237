//! Incremental construction of a [`NetworkDefinition`] with node sharing.

use std::collections::HashSet;
use std::sync::Arc;

use scoreforge_core::domain::SolutionSchema;
use scoreforge_core::{ConfigurationError, ConstraintRef, ImpactType, Score};
use smallvec::SmallVec;
use tracing::debug;

use crate::stream::joiner::{filtering, Joiner};

use super::definition::{
    ConstraintDefinition, InputSide, MatchWeigher, NetworkDefinition, NodeDefinition, NodeId,
    NodeKind,
};

/// Largest tuple arity a node may emit.
pub const MAX_ARITY: usize = 4;

/// Collects nodes and constraints while streams are being defined.
///
/// A node request whose kind and inputs match an existing node returns that
/// node instead of creating a new one. The first error is kept and reported
/// by [`build`](NetworkBuilder::build).
pub(crate) struct NetworkBuilder<Sc: Score> {
    schema: Arc<SolutionSchema>,
    nodes: Vec<NodeDefinition>,
    constraints: Vec<ConstraintDefinition<Sc>>,
    names: HashSet<String>,
    shared: usize,
    error: Option<ConfigurationError>,
    package: String,
    different_fact: Joiner,
}

impl<Sc: Score> NetworkBuilder<Sc> {
    pub(crate) fn new(schema: Arc<SolutionSchema>) -> Self {
        Self {
            schema,
            nodes: Vec::new(),
            constraints: Vec::new(),
            names: HashSet::new(),
            shared: 0,
            error: None,
            package: String::new(),
            different_fact: filtering(|left, right| left.get(0) != right.get(0)),
        }
    }

    pub(crate) fn package(&self) -> &str {
        &self.package
    }

    pub(crate) fn set_package(&mut self, package: String) {
        self.package = package;
    }

    /// Joiner rejecting pairs whose first elements are the same fact.
    pub(crate) fn different_fact(&self) -> Joiner {
        self.different_fact.clone()
    }

    pub(crate) fn schema(&self) -> &Arc<SolutionSchema> {
        &self.schema
    }

    pub(crate) fn record(&mut self, error: ConfigurationError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub(crate) fn arity(&self, node: NodeId) -> usize {
        self.nodes[node.index()].arity
    }

    pub(crate) fn source(
        &mut self,
        class: &str,
        include_unassigned: bool,
    ) -> Result<NodeId, ConfigurationError> {
        let class = self.schema.class_id(class)?;
        self.node(
            NodeKind::Source {
                class,
                include_unassigned,
            },
            &[],
            1,
        )
    }

    /// Returns a node with `kind` over `inputs`, reusing an equal one.
    pub(crate) fn node(
        &mut self,
        kind: NodeKind,
        inputs: &[NodeId],
        arity: usize,
    ) -> Result<NodeId, ConfigurationError> {
        if arity > MAX_ARITY {
            return Err(ConfigurationError::TupleArityExceeded { arity });
        }

        let existing = match inputs.first() {
            Some(first) => self.nodes[first.index()]
                .children
                .iter()
                .map(|&(child, _)| child)
                .find(|child| {
                    let node = &self.nodes[child.index()];
                    node.inputs.as_slice() == inputs && node.kind.shares_with(&kind)
                }),
            None => (0..self.nodes.len())
                .map(|i| NodeId(i as u32))
                .find(|id| {
                    let node = &self.nodes[id.index()];
                    node.inputs.is_empty() && node.kind.shares_with(&kind)
                }),
        };
        if let Some(id) = existing {
            self.shared += 1;
            return Ok(id);
        }

        let id = NodeId(self.nodes.len() as u32);
        for (i, input) in inputs.iter().enumerate() {
            let side = if i == 0 {
                InputSide::Left
            } else {
                InputSide::Right
            };
            self.nodes[input.index()].children.push((id, side));
        }
        self.nodes.push(NodeDefinition {
            kind,
            inputs: SmallVec::from_slice(inputs),
            arity,
            children: Vec::new(),
        });
        Ok(id)
    }

    pub(crate) fn constraint(
        &mut self,
        constraint_ref: ConstraintRef,
        weight: Sc,
        impact: ImpactType,
        weigher: MatchWeigher,
        input: NodeId,
    ) -> Result<(), ConfigurationError> {
        let name = constraint_ref.full_name();
        if !self.names.insert(name.clone()) {
            return Err(ConfigurationError::DuplicateConstraint { name });
        }
        let constraint = self.constraints.len();
        let arity = self.arity(input);
        let node = self.node(
            NodeKind::Score {
                constraint,
                weigher,
            },
            &[input],
            arity,
        )?;
        self.constraints.push(ConstraintDefinition {
            constraint_ref,
            weight,
            impact,
            node,
        });
        Ok(())
    }

    pub(crate) fn build(self) -> Result<NetworkDefinition<Sc>, ConfigurationError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut sources = vec![SmallVec::new(); self.schema.class_count()];
        for (i, node) in self.nodes.iter().enumerate() {
            if let NodeKind::Source { class, .. } = node.kind {
                sources[class.index()].push(NodeId(i as u32));
            }
        }

        debug!(
            event = "network_built",
            nodes = self.nodes.len(),
            shared_nodes = self.shared,
            constraints = self.constraints.len(),
        );

        Ok(NetworkDefinition {
            schema: self.schema,
            nodes: self.nodes,
            sources,
            constraints: self.constraints,
            shared_nodes: self.shared,
        })
    }
}
