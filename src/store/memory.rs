//! In-memory graph source for tests and embedding callers.

use std::collections::BTreeSet;
use std::convert::Infallible;

use super::GraphSource;
use crate::types::{NodeId, SemanticEdge};

/// In-memory graph source.
///
/// Uses a BTreeSet for deterministic node order. Edges keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraphSource {
    nodes: BTreeSet<NodeId>,
    edges: Vec<SemanticEdge>,
}

impl InMemoryGraphSource {
    /// Create a new empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node.
    pub fn add_node(&mut self, id: impl Into<NodeId>) {
        self.nodes.insert(id.into());
    }

    /// Add an edge and its endpoints.
    pub fn add_edge(&mut self, edge: SemanticEdge) {
        self.nodes.insert(edge.a.clone());
        self.nodes.insert(edge.b.clone());
        self.edges.push(edge);
    }

    /// Builder form of [`add_edge`](Self::add_edge).
    pub fn with_edge(mut self, edge: SemanticEdge) -> Self {
        self.add_edge(edge);
        self
    }

    /// Get number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Get number of edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }
}

impl GraphSource for InMemoryGraphSource {
    type Error = Infallible;

    fn nodes(&self) -> Result<Vec<NodeId>, Self::Error> {
        Ok(self.nodes.iter().cloned().collect())
    }

    fn edges(&self) -> Result<Vec<SemanticEdge>, Self::Error> {
        Ok(self.edges.clone())
    }
}
