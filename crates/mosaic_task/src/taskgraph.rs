//! Dataflow task graphs: typed nodes and multi-endpoint edges.

use indexmap::IndexMap;
use mosaic_common::{Ident, MappingError, Metadata, MosaicResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A task: a unit of work to be assigned to one fabric slot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskNode {
    /// The task name, unique within its graph.
    pub name: Ident,
    /// Opaque metadata consulted only through the `RuleSet` oracle.
    pub metadata: Metadata,
}

impl TaskNode {
    /// Creates a task with empty metadata.
    pub fn new(name: Ident) -> Self {
        Self {
            name,
            metadata: Metadata::new(),
        }
    }

    /// Creates a task with the given metadata.
    pub fn with_metadata(name: Ident, metadata: Metadata) -> Self {
        Self { name, metadata }
    }
}

/// A dataflow connection from a set of source tasks to a set of sink tasks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskEdge {
    /// Names of the tasks driving this edge.
    pub sources: Vec<Ident>,
    /// Names of the tasks consuming this edge.
    pub sinks: Vec<Ident>,
    /// Opaque metadata consulted only through the `RuleSet` oracle.
    pub metadata: Metadata,
}

impl TaskEdge {
    /// Creates an edge with empty metadata.
    pub fn new(sources: Vec<Ident>, sinks: Vec<Ident>) -> Self {
        Self {
            sources,
            sinks,
            metadata: Metadata::new(),
        }
    }

    /// The fanout of the edge: its number of sinks.
    pub fn fanout(&self) -> usize {
        self.sinks.len()
    }
}

/// A name-keyed dataflow graph with precomputed adjacency lists.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Taskgraph {
    /// The graph name.
    pub name: Ident,
    nodes: IndexMap<Ident, TaskNode>,
    edges: Vec<TaskEdge>,
    /// Edge indices having each node among their sources.
    #[serde(skip)]
    out_edges: HashMap<Ident, Vec<usize>>,
    /// Edge indices having each node among their sinks.
    #[serde(skip)]
    in_edges: HashMap<Ident, Vec<usize>>,
}

impl Taskgraph {
    /// Creates an empty task graph.
    pub fn new(name: Ident) -> Self {
        Self {
            name,
            nodes: IndexMap::new(),
            edges: Vec::new(),
            out_edges: HashMap::new(),
            in_edges: HashMap::new(),
        }
    }

    /// Adds a node.
    ///
    /// Fails if a node with the same name already exists.
    pub fn add_node(&mut self, node: TaskNode) -> MosaicResult<()> {
        if self.nodes.contains_key(&node.name) {
            return Err(MappingError::Construction(format!(
                "duplicate task {:?}",
                node.name
            )));
        }
        self.nodes.insert(node.name, node);
        Ok(())
    }

    /// Adds an edge and updates the adjacency lists.
    ///
    /// Every endpoint name must already be a node of the graph.
    pub fn add_edge(&mut self, edge: TaskEdge) -> MosaicResult<usize> {
        for name in edge.sources.iter().chain(&edge.sinks) {
            if !self.nodes.contains_key(name) {
                return Err(MappingError::Construction(format!(
                    "edge endpoint {name:?} is not a task of this graph"
                )));
            }
        }
        let index = self.edges.len();
        for &name in &edge.sources {
            self.out_edges.entry(name).or_default().push(index);
        }
        for &name in &edge.sinks {
            self.in_edges.entry(name).or_default().push(index);
        }
        self.edges.push(edge);
        Ok(index)
    }

    /// Returns the node with the given name.
    pub fn node(&self, name: Ident) -> Option<&TaskNode> {
        self.nodes.get(&name)
    }

    /// Iterates over nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &TaskNode> {
        self.nodes.values()
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the edge list.
    pub fn edges(&self) -> &[TaskEdge] {
        &self.edges
    }

    /// Returns the indices of edges driven by `name`.
    pub fn out_edges(&self, name: Ident) -> &[usize] {
        self.out_edges.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the indices of edges consumed by `name`.
    pub fn in_edges(&self, name: Ident) -> &[usize] {
        self.in_edges.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rebuilds the adjacency lists after deserialization.
    pub fn rebuild_adjacency(&mut self) {
        self.out_edges.clear();
        self.in_edges.clear();
        for (index, edge) in self.edges.iter().enumerate() {
            for &name in &edge.sources {
                self.out_edges.entry(name).or_default().push(index);
            }
            for &name in &edge.sinks {
                self.in_edges.entry(name).or_default().push(index);
            }
        }
    }
}
