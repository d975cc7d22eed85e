//! Node and edge types for the semantic graph.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a node in the semantic graph.
///
/// Implements `Ord` so neighbor expansion can be ordered deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Kind of relation an edge encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Semantic affinity between two concepts.
    Semantic,
    /// One node cites the other. Citation walks follow only these.
    Citation,
}

impl EdgeKind {
    /// Parse edge kind from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "semantic" | "" => Some(Self::Semantic),
            "citation" => Some(Self::Citation),
            _ => None,
        }
    }
}

impl Default for EdgeKind {
    fn default() -> Self {
        Self::Semantic
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Semantic => write!(f, "semantic"),
            Self::Citation => write!(f, "citation"),
        }
    }
}

/// Payload carried by an undirected graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    /// Semantic affinity in [0, 1].
    pub weight: f32,
    /// Relation kind.
    pub kind: EdgeKind,
}

impl EdgeData {
    /// Create edge data, clamping the weight into [0, 1].
    ///
    /// A non-finite weight becomes 0.0.
    pub fn new(weight: f32, kind: EdgeKind) -> Self {
        let weight = if weight.is_finite() {
            weight.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self { weight, kind }
    }

    /// Traversal cost for shortest-path search. Higher affinity is cheaper.
    pub fn traversal_cost(&self) -> f64 {
        1.0 / (self.weight as f64 + 0.01)
    }
}

/// Undirected edge between two nodes of the semantic graph.
///
/// Endpoints are stored in canonical order (`a <= b`), so `Ord` and `Eq`
/// do not depend on the direction an edge was declared in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticEdge {
    /// Lower endpoint.
    pub a: NodeId,
    /// Higher endpoint.
    pub b: NodeId,
    /// Weight and kind.
    pub data: EdgeData,
}

impl SemanticEdge {
    /// Create a new edge.
    pub fn new(x: impl Into<NodeId>, y: impl Into<NodeId>, weight: f32, kind: EdgeKind) -> Self {
        let (x, y) = (x.into(), y.into());
        let (a, b) = if x <= y { (x, y) } else { (y, x) };
        Self {
            a,
            b,
            data: EdgeData::new(weight, kind),
        }
    }

    /// Create a semantic edge.
    pub fn semantic(x: impl Into<NodeId>, y: impl Into<NodeId>, weight: f32) -> Self {
        Self::new(x, y, weight, EdgeKind::Semantic)
    }

    /// Create a citation edge.
    pub fn citation(x: impl Into<NodeId>, y: impl Into<NodeId>, weight: f32) -> Self {
        Self::new(x, y, weight, EdgeKind::Citation)
    }

    /// Whether this edge connects `x` and `y` in either direction.
    pub fn connects(&self, x: &NodeId, y: &NodeId) -> bool {
        (&self.a == x && &self.b == y) || (&self.a == y && &self.b == x)
    }
}
