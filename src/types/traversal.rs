//! Traversal result types.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::edge::NodeId;

/// How a traversal was configured to find its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalMethod {
    /// Candidate enumeration plus one-hot selection by a solver backend.
    Optimized,
    /// Weighted shortest path.
    Classical,
}

impl fmt::Display for TraversalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimized => write!(f, "optimized"),
            Self::Classical => write!(f, "classical"),
        }
    }
}

/// Outcome of one traversal call. Created fresh per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraversalResult {
    /// Path from start to target (at least one node).
    pub path: Vec<NodeId>,
    /// Citation neighborhood of the terminal node.
    pub citations: Vec<NodeId>,
    /// Path cost: `len * (1 - coherence)` for the selected path.
    pub cost: f64,
    /// Mean edge affinity along the path, in [0, 1].
    pub coherence: f32,
    /// Configured traversal method.
    pub method: TraversalMethod,
    /// True when an optimized traversal was served by the classical fallback.
    pub fell_back: bool,
    /// Wall-clock latency.
    pub latency_ms: f64,
}

impl TraversalResult {
    /// Number of nodes in the path.
    pub fn path_len(&self) -> usize {
        self.path.len()
    }

    /// Terminal node of the path.
    pub fn terminal(&self) -> Option<&NodeId> {
        self.path.last()
    }

    /// Whether the path actually reaches `target`.
    pub fn reaches(&self, target: &NodeId) -> bool {
        self.terminal() == Some(target)
    }

    /// Render the path as text, e.g. `A -> B -> C`.
    pub fn render_path(&self) -> String {
        self.path
            .iter()
            .map(NodeId::as_str)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
