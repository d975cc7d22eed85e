//! JSON graph documents.
//!
//! ```text
//! {
//!   "nodes": ["A", "B", "C"],
//!   "edges": [
//!     {"source": "A", "target": "B", "weight": 0.8, "type": "semantic"},
//!     {"source": "B", "target": "C", "weight": 0.9, "type": "citation"}
//!   ]
//! }
//! ```
//!
//! `nodes` may be omitted; endpoints named by edges are added implicitly.
//! `weight` defaults to 1.0 and `type` to `semantic`. The document is
//! validated once on load, so reads never fail afterwards.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

use super::{GraphSource, GraphSourceError};
use crate::types::{EdgeKind, NodeId, SemanticEdge};

#[derive(Debug, Deserialize)]
struct GraphDocument {
    #[serde(default)]
    nodes: Vec<String>,
    #[serde(default)]
    edges: Vec<EdgeRecord>,
}

#[derive(Debug, Deserialize)]
struct EdgeRecord {
    source: String,
    target: String,
    #[serde(default = "default_weight")]
    weight: f32,
    #[serde(default, rename = "type")]
    kind: String,
}

fn default_weight() -> f32 {
    1.0
}

/// Graph source backed by a validated JSON document.
#[derive(Debug, Clone, Default)]
pub struct JsonGraphSource {
    nodes: BTreeSet<NodeId>,
    edges: Vec<SemanticEdge>,
}

impl JsonGraphSource {
    /// Parse and validate a document.
    pub fn from_json_str(json: &str) -> Result<Self, GraphSourceError> {
        let doc: GraphDocument = serde_json::from_str(json)?;

        let mut nodes: BTreeSet<NodeId> = doc.nodes.into_iter().map(NodeId::from).collect();
        let mut edges = Vec::with_capacity(doc.edges.len());

        for record in doc.edges {
            if !record.weight.is_finite() || !(0.0..=1.0).contains(&record.weight) {
                return Err(GraphSourceError::InvalidWeight {
                    source_node: record.source,
                    target: record.target,
                    weight: record.weight,
                });
            }
            let Some(kind) = EdgeKind::from_str(&record.kind) else {
                return Err(GraphSourceError::UnknownEdgeKind {
                    source_node: record.source,
                    target: record.target,
                    kind: record.kind,
                });
            };

            let edge = SemanticEdge::new(record.source, record.target, record.weight, kind);
            nodes.insert(edge.a.clone());
            nodes.insert(edge.b.clone());
            edges.push(edge);
        }

        Ok(Self { nodes, edges })
    }

    /// Read, parse and validate a document file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GraphSourceError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Get number of edges as declared, including repeats.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }
}

impl GraphSource for JsonGraphSource {
    type Error = GraphSourceError;

    fn nodes(&self) -> Result<Vec<NodeId>, Self::Error> {
        Ok(self.nodes.iter().cloned().collect())
    }

    fn edges(&self) -> Result<Vec<SemanticEdge>, Self::Error> {
        Ok(self.edges.clone())
    }
}
