//! Graph sources and the report store.
//!
//! A [`GraphSource`] supplies the nodes and weighted, typed edges the
//! traversal engine reads. The core never writes back to a source.

pub mod json;
pub mod memory;
pub mod results;

use crate::types::{NodeId, SemanticEdge};

/// Trait for graph data sources.
///
/// Implementations must return nodes and edges in a deterministic order.
pub trait GraphSource {
    /// Error type for source operations.
    type Error: std::error::Error + Send + Sync;

    /// All node ids, including nodes without edges.
    fn nodes(&self) -> Result<Vec<NodeId>, Self::Error>;

    /// All edges.
    fn edges(&self) -> Result<Vec<SemanticEdge>, Self::Error>;
}

/// Errors reading a graph document.
#[derive(Debug, thiserror::Error)]
pub enum GraphSourceError {
    /// The document is not valid JSON or has the wrong shape.
    #[error("Malformed graph document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// An edge weight is outside [0, 1] or not finite.
    #[error("Edge {source_node}-{target} has invalid weight {weight}")]
    InvalidWeight {
        /// Source node.
        source_node: String,
        /// Target node.
        target: String,
        /// Offending weight.
        weight: f32,
    },

    /// An edge names a type other than `semantic` or `citation`.
    #[error("Edge {source_node}-{target} has unknown type '{kind}'")]
    UnknownEdgeKind {
        /// Source node.
        source_node: String,
        /// Target node.
        target: String,
        /// Offending type tag.
        kind: String,
    },

    /// IO error reading a document.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub use json::JsonGraphSource;
pub use memory::InMemoryGraphSource;
pub use results::{ReportStore, ReportSummary};
