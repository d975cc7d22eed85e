//! # evaluation-oracle
//!
//! Gold-standard scoring oracle for multilingual agent evaluation.
//!
//! A candidate's output is judged by routing its query through layered
//! context, finding a coherent path through a semantic graph, and running
//! the result through an edit repair stream that measures reliability and
//! hallucination rate.
//!
//! ## Architecture
//!
//! ```text
//! OracleQuery → ContextRouter → GraphTraversalEngine → EditRepairStream → OracleReport
//!                    ↓                   ↓                     ↓
//!             3 context layers    SemanticGraph +        DualMemory
//!                                 SelectionSolver
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Routing ties break by insertion order (stable sort)
//! - Neighbor expansion is ordered by node id
//! - Config hashes quantize floats before hashing
//!
//! ## Example
//!
//! ```rust
//! use evaluation_oracle::{
//!     ContextEntry, ContextLayer, ContextQuery, OracleConfig, OracleOrchestrator, OracleQuery,
//!     SemanticEdge, SemanticGraph,
//! };
//!
//! let graph = SemanticGraph::from_edges([
//!     SemanticEdge::semantic("A", "B", 0.8),
//!     SemanticEdge::citation("B", "C", 0.9),
//! ]);
//! let oracle = OracleOrchestrator::new(OracleConfig::default(), graph).unwrap();
//! oracle.router().add_context(ContextEntry::new("B cites C", ContextLayer::Global, vec![1.0, 0.0], "en"));
//!
//! let query = OracleQuery::new(ContextQuery::new(vec![1.0, 0.0], "en"), "A", "C");
//! let report = oracle.evaluate(&query);
//! assert_eq!(report.traversal.render_path(), "A -> B -> C");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod similarity;
pub mod policy;
pub mod router;
pub mod graph;
pub mod store;
pub mod traversal;
pub mod repair;
pub mod balance;
pub mod oracle;
pub mod canonical;
pub mod canonical_content;
pub mod telemetry;

// Re-exports
pub use types::{
    ContextEntry, ContextLayer, EdgeData, EdgeKind, Edit, EditId, EditType, Embedding,
    HallucinationType, MemoryEntry, MemoryTier, NodeId, SemanticEdge, TraversalMethod,
    TraversalResult,
};
pub use similarity::{cosine_similarity, similarity};
pub use policy::{
    ConfigError, MemoryPolicy, OracleConfig, RoutingPolicy, ScoredEntry, TraversalMode,
    TraversalPolicy,
};
pub use router::{ContextQuery, ContextRouter, RoutedContext};
pub use graph::{GraphError, SemanticGraph};
pub use store::{
    GraphSource, GraphSourceError, InMemoryGraphSource, JsonGraphSource, ReportStore,
    ReportSummary,
};
pub use traversal::{
    ExhaustiveSolver, GraphTraversalEngine, Selection, SelectionProblem, SelectionSolver,
    SolverError,
};
pub use repair::{
    AppliedEdit, DualMemory, EditDraft, EditOutcome, EditProvenance, EditRepairStream,
    HeuristicQualityOracle, RepairContext, RepairOutcome, StreamStatistics, TextQualityOracle,
};
pub use balance::{LayerBalanceAnalyzer, LayerBalanceMetrics};
pub use oracle::{OracleMetrics, OracleOrchestrator, OracleQuery, OracleReport};
pub use canonical::{canonical_hash_hex, Fingerprint};
pub use canonical_content::{
    canonical_content, compute_content_hash, normalize_text, CANONICAL_CONTENT_VERSION,
};
pub use telemetry::{init_tracing, LogFormat, TelemetryError};
