//! Undirected semantic graph.
//!
//! Wraps a petgraph `UnGraph` with a `NodeId -> NodeIndex` map. The graph is
//! built once from a [`GraphSource`] and only read during traversals.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::BTreeMap;

use crate::store::GraphSource;
use crate::types::{EdgeData, NodeId, SemanticEdge};

/// Error building a graph from a source.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The source failed to supply nodes or edges.
    #[error("Graph source error: {0}")]
    Source(String),
}

impl GraphError {
    /// Create a source error from any error type.
    pub fn from_source<E: std::error::Error>(e: E) -> Self {
        Self::Source(e.to_string())
    }
}

/// Weighted, typed, undirected graph over opaque node ids.
///
/// May be disconnected. At most one edge joins a pair of nodes; adding an
/// edge for an existing pair replaces its data.
#[derive(Debug, Clone, Default)]
pub struct SemanticGraph {
    graph: UnGraph<NodeId, EdgeData>,
    index: BTreeMap<NodeId, NodeIndex>,
}

impl SemanticGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a source.
    pub fn from_source<S: GraphSource>(source: &S) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for node in source.nodes().map_err(GraphError::from_source)? {
            graph.add_node(node);
        }
        for edge in source.edges().map_err(GraphError::from_source)? {
            graph.add_edge(edge);
        }
        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built semantic graph"
        );
        Ok(graph)
    }

    /// Build a graph from edges alone.
    pub fn from_edges(edges: impl IntoIterator<Item = SemanticEdge>) -> Self {
        let mut graph = Self::new();
        for edge in edges {
            graph.add_edge(edge);
        }
        graph
    }

    /// Add a node if absent and return its index.
    pub fn add_node(&mut self, id: NodeId) -> NodeIndex {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(id.clone());
        self.index.insert(id, idx);
        idx
    }

    /// Add an edge, creating its endpoints. Replaces data for an existing pair.
    pub fn add_edge(&mut self, edge: SemanticEdge) {
        let a = self.add_node(edge.a);
        let b = self.add_node(edge.b);
        self.graph.update_edge(a, b, edge.data);
    }

    /// Index of a node.
    pub fn index_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Id of the node at `idx`.
    pub fn node_id(&self, idx: NodeIndex) -> &NodeId {
        &self.graph[idx]
    }

    /// Whether the node exists.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Data of the edge joining `a` and `b`, if adjacent.
    pub fn edge(&self, a: &NodeId, b: &NodeId) -> Option<EdgeData> {
        let (ia, ib) = (self.index_of(a)?, self.index_of(b)?);
        self.graph.find_edge(ia, ib).map(|e| self.graph[e])
    }

    /// Neighbors of a node with edge data, ordered by node id.
    pub fn neighbors(&self, id: &NodeId) -> Vec<(NodeId, EdgeData)> {
        let Some(idx) = self.index_of(id) else {
            return Vec::new();
        };
        let mut out: Vec<(NodeId, EdgeData)> = self
            .graph
            .edges(idx)
            .map(|e| {
                let other = if e.source() == idx { e.target() } else { e.source() };
                (self.graph[other].clone(), *e.weight())
            })
            .collect();
        out.sort_by(|x, y| x.0.cmp(&y.0));
        out
    }

    /// Node ids in sorted order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.index.keys()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Underlying petgraph graph.
    pub fn inner(&self) -> &UnGraph<NodeId, EdgeData> {
        &self.graph
    }
}
