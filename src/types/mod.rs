//! Core types for the evaluation oracle.

pub mod context;
pub mod edge;
pub mod edit;
pub mod traversal;

pub use context::{ContextEntry, ContextLayer, Embedding};
pub use edge::{EdgeData, EdgeKind, NodeId, SemanticEdge};
pub use edit::{Edit, EditId, EditType, HallucinationType, MemoryEntry, MemoryTier};
pub use traversal::{TraversalMethod, TraversalResult};
