//! Listener dependency graph and global shadow order.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use scoreforge_core::domain::{
    ClassId, ListenerDeclaration, SolutionSchema, VariableListener,
};
use scoreforge_core::{ConfigurationError, FieldRef};
use smallvec::SmallVec;
use tracing::debug;

/// Listeners sorted into global shadow order.
///
/// A listener's order is its index here. Every listener writing a source of
/// listener `j` has an order below `j`, so draining notifications in
/// ascending order runs each listener after everything it reads has settled.
#[derive(Debug)]
pub struct ShadowGraph {
    listeners: Vec<ListenerDeclaration>,
    by_source: HashMap<FieldRef, SmallVec<[usize; 2]>>,
    by_class: HashMap<ClassId, SmallVec<[usize; 2]>>,
    owners: HashMap<FieldRef, usize>,
}

impl ShadowGraph {
    /// Orders the listeners declared in `schema`.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::CyclicShadowDependency`] naming one cycle, as
    /// `A -> B -> A`.
    pub fn compile(schema: &SolutionSchema) -> Result<Self, ConfigurationError> {
        let declarations = schema.listeners();
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..declarations.len()).map(|i| graph.add_node(i)).collect();

        for (i, writer) in declarations.iter().enumerate() {
            for (j, reader) in declarations.iter().enumerate() {
                if writer.targets().iter().any(|t| reader.sources().contains(t)) {
                    graph.add_edge(nodes[i], nodes[j], ());
                }
            }
        }

        let sorted = match toposort(&graph, None) {
            Ok(sorted) => sorted,
            Err(_) => {
                return Err(ConfigurationError::CyclicShadowDependency {
                    cycle: describe_cycle(&graph, declarations),
                })
            }
        };

        let listeners: Vec<ListenerDeclaration> = sorted
            .iter()
            .map(|&node| declarations[graph[node]].clone())
            .collect();

        let mut by_source: HashMap<FieldRef, SmallVec<[usize; 2]>> = HashMap::new();
        let mut by_class: HashMap<ClassId, SmallVec<[usize; 2]>> = HashMap::new();
        let mut owners = HashMap::new();
        for (order, declaration) in listeners.iter().enumerate() {
            let mut classes: SmallVec<[ClassId; 2]> = SmallVec::new();
            for &source in declaration.sources() {
                by_source.entry(source).or_default().push(order);
                if !classes.contains(&source.class()) {
                    classes.push(source.class());
                }
            }
            for class in classes {
                by_class.entry(class).or_default().push(order);
            }
            for &target in declaration.targets() {
                owners.insert(target, order);
            }
        }

        debug!(
            event = "shadow_graph_compiled",
            listeners = listeners.len(),
            order = ?listeners.iter().map(ListenerDeclaration::name).collect::<Vec<_>>(),
        );

        Ok(Self {
            listeners,
            by_source,
            by_class,
            owners,
        })
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn name(&self, order: usize) -> &str {
        self.listeners.get(order).map_or("", ListenerDeclaration::name)
    }

    /// Listener names in global shadow order.
    pub fn names(&self) -> Vec<&str> {
        self.listeners.iter().map(ListenerDeclaration::name).collect()
    }

    /// Variables listener `order` reads.
    pub fn sources(&self, order: usize) -> &[FieldRef] {
        self.listeners.get(order).map_or(&[], ListenerDeclaration::sources)
    }

    /// Listeners reading `field`, ascending.
    pub fn readers_of(&self, field: FieldRef) -> &[usize] {
        self.by_source.get(&field).map_or(&[], |v| v.as_slice())
    }

    /// Listeners with a source on `class`, ascending.
    pub fn listeners_of_class(&self, class: ClassId) -> &[usize] {
        self.by_class.get(&class).map_or(&[], |v| v.as_slice())
    }

    /// The listener that writes `field`.
    pub fn owner(&self, field: FieldRef) -> Option<usize> {
        self.owners.get(&field).copied()
    }

    /// Source classes of listener `order`.
    pub(crate) fn source_classes(&self, order: usize) -> SmallVec<[ClassId; 2]> {
        let mut classes = SmallVec::new();
        if let Some(declaration) = self.listeners.get(order) {
            for source in declaration.sources() {
                if !classes.contains(&source.class()) {
                    classes.push(source.class());
                }
            }
        }
        classes
    }

    /// Fresh listener instances, one per order.
    pub(crate) fn instantiate(&self) -> Vec<Option<Box<dyn VariableListener>>> {
        self.listeners.iter().map(|d| Some(d.create())).collect()
    }
}

/// Renders the shortest cycle through the first cyclic component found.
fn describe_cycle(graph: &DiGraph<usize, ()>, declarations: &[ListenerDeclaration]) -> String {
    let component = tarjan_scc(graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .min_by_key(|scc| scc.iter().map(|n| graph[*n]).min());
    let Some(component) = component else {
        return String::new();
    };
    let members: HashSet<NodeIndex> = component.iter().copied().collect();
    let Some(&start) = component.iter().min_by_key(|n| graph[**n]) else {
        return String::new();
    };

    // breadth first from start's successors back to start
    let mut previous: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::new();
    for next in graph.neighbors(start) {
        if members.contains(&next) && !previous.contains_key(&next) {
            previous.insert(next, start);
            queue.push_back(next);
        }
    }
    while let Some(node) = queue.pop_front() {
        if node == start {
            break;
        }
        for next in graph.neighbors(node) {
            if members.contains(&next) && !previous.contains_key(&next) {
                previous.insert(next, node);
                queue.push_back(next);
            }
        }
    }

    let mut path = vec![start];
    let mut cursor = start;
    while let Some(&before) = previous.get(&cursor) {
        if before == start {
            break;
        }
        path.push(before);
        cursor = before;
        if path.len() > members.len() {
            break;
        }
    }
    path.push(start);
    path.reverse();
    path.iter()
        .map(|n| declarations[graph[*n]].name())
        .collect::<Vec<_>>()
        .join(" -> ")
}
