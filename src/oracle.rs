//! Oracle orchestrator: route, traverse, repair, aggregate.
//!
//! ## Pipeline
//!
//! 1. Route the query embedding through the context layers and merge the
//!    matches into one context blob.
//! 2. Traverse the semantic graph from `start` to `target`.
//! 3. Repair the candidate text (or the rendered path when no candidate is
//!    given) against the path's entities.
//! 4. Derive scalar metrics and package everything as an [`OracleReport`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::graph::SemanticGraph;
use crate::policy::{ConfigError, OracleConfig};
use crate::repair::{EditRepairStream, RepairContext, RepairOutcome, TextQualityOracle};
use crate::router::{ContextQuery, ContextRouter, RoutedContext};
use crate::store::ReportStore;
use crate::traversal::{GraphTraversalEngine, SelectionSolver};
use crate::types::{NodeId, TraversalResult};

/// Provenance tag for corrections of traversal output.
pub const TRAVERSAL_SOURCE: &str = "graph_traversal";

/// One evaluation request.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleQuery {
    /// Routing query (embedding, language, domain, complexity, top-k).
    pub context: ContextQuery,
    /// Traversal start node.
    pub start: NodeId,
    /// Traversal target node.
    pub target: NodeId,
    /// Whether to walk citations from the path's terminal node.
    pub use_citations: bool,
    /// Candidate output to judge. The rendered path is used when absent.
    pub candidate_text: Option<String>,
}

impl OracleQuery {
    /// Create a query with citations enabled and no candidate text.
    pub fn new(context: ContextQuery, start: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            context,
            start: start.into(),
            target: target.into(),
            use_citations: true,
            candidate_text: None,
        }
    }

    /// Judge this text instead of the rendered path.
    pub fn with_candidate_text(mut self, text: impl Into<String>) -> Self {
        self.candidate_text = Some(text.into());
        self
    }

    /// Enable or disable the citation walk.
    pub fn with_citations(mut self, use_citations: bool) -> Self {
        self.use_citations = use_citations;
        self
    }
}

/// Scalar metrics of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleMetrics {
    /// End-to-end wall-clock latency.
    pub total_latency_ms: f64,
    /// Traversal latency.
    pub traversal_latency_ms: f64,
    /// Path coherence.
    pub coherence: f32,
    /// Reliability of the repaired text.
    pub reliability: f32,
    /// Edits flagged per word of the subject text.
    pub hallucination_rate: f32,
    /// Edits flagged.
    pub edits_flagged: usize,
    /// Context entries routed across all layers.
    pub routed_entries: usize,
    /// Word-overlap grounding of the subject text in the merged context.
    pub grounding: f32,
}

/// Full output bundle of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleReport {
    /// Unique run id.
    pub run_id: Uuid,
    /// Completion time.
    pub timestamp: DateTime<Utc>,
    /// Hash of the config that produced this report.
    pub config_hash: String,
    /// Query language.
    pub language: String,
    /// Per-layer routed matches.
    pub routed: RoutedContext,
    /// Merged context blob.
    pub merged_context: String,
    /// Traversal result.
    pub traversal: TraversalResult,
    /// Repair result.
    pub repair: RepairOutcome,
    /// Derived metrics.
    pub metrics: OracleMetrics,
}

/// Composes the router, traversal engine and repair stream.
pub struct OracleOrchestrator {
    config: OracleConfig,
    config_hash: String,
    router: ContextRouter,
    engine: GraphTraversalEngine,
    stream: EditRepairStream,
}

impl OracleOrchestrator {
    /// Validate the config and build every component.
    pub fn new(config: OracleConfig, graph: impl Into<Arc<SemanticGraph>>) -> Result<Self, ConfigError> {
        config.validate()?;

        let router = ContextRouter::new(config.routing.clone());
        let engine = GraphTraversalEngine::new(graph, config.traversal.clone());
        let stream = EditRepairStream::new(config.memory.clone());
        let config_hash = config.params_hash();

        tracing::debug!(config_hash = %config_hash, "oracle orchestrator ready");
        Ok(Self {
            config,
            config_hash,
            router,
            engine,
            stream,
        })
    }

    /// Replace the solver backend.
    pub fn with_solver(mut self, solver: Arc<dyn SelectionSolver>) -> Self {
        self.engine = self.engine.with_solver(solver);
        self
    }

    /// Replace the quality oracle. Starts a fresh repair stream.
    pub fn with_quality_oracle(mut self, oracle: Arc<dyn TextQualityOracle>) -> Self {
        self.stream = EditRepairStream::with_oracle(self.config.memory.clone(), oracle);
        self
    }

    /// The config.
    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Hash of the config.
    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    /// The context router, for ingestion.
    pub fn router(&self) -> &ContextRouter {
        &self.router
    }

    /// The traversal engine.
    pub fn engine(&self) -> &GraphTraversalEngine {
        &self.engine
    }

    /// The repair stream.
    pub fn stream(&self) -> &EditRepairStream {
        &self.stream
    }

    /// Run one evaluation.
    pub fn evaluate(&self, query: &OracleQuery) -> OracleReport {
        let started = Instant::now();

        let routed = self.router.route_context(&query.context);
        let merged_context = self
            .router
            .merge_context(&routed, self.config.routing.max_context_tokens);

        let traversal = self.engine.traverse(&query.start, &query.target, query.use_citations);

        let subject = query
            .candidate_text
            .clone()
            .unwrap_or_else(|| traversal.render_path());
        let repair_context = RepairContext::new()
            .with_entities(traversal.path.iter().map(NodeId::to_string))
            .with_source(TRAVERSAL_SOURCE)
            .with_coherence(traversal.coherence);
        let repair = self.stream.apply_edits(&subject, &repair_context);

        let words = subject.split_whitespace().count();
        let hallucination_rate = if words == 0 {
            0.0
        } else {
            repair.edits.len() as f32 / words as f32
        };
        let grounding = self.stream.oracle().grounding(&subject, &merged_context);

        let metrics = OracleMetrics {
            total_latency_ms: started.elapsed().as_secs_f64() * 1000.0,
            traversal_latency_ms: traversal.latency_ms,
            coherence: traversal.coherence,
            reliability: repair.reliability_score,
            hallucination_rate,
            edits_flagged: repair.edits.len(),
            routed_entries: routed.total_matches(),
            grounding,
        };

        let report = OracleReport {
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            config_hash: self.config_hash.clone(),
            language: query.context.language.clone(),
            routed,
            merged_context,
            traversal,
            repair,
            metrics,
        };

        tracing::info!(
            run_id = %report.run_id,
            coherence = report.metrics.coherence,
            reliability = report.metrics.reliability,
            hallucination_rate = report.metrics.hallucination_rate,
            fell_back = report.traversal.fell_back,
            latency_ms = report.metrics.total_latency_ms,
            "oracle evaluation complete"
        );
        report
    }

    /// Run one evaluation and record it in `store`.
    pub fn evaluate_into(&self, query: &OracleQuery, store: &ReportStore) -> OracleReport {
        let report = self.evaluate(query);
        store.insert(report.clone());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContextEntry, ContextLayer, SemanticEdge};

    fn make_orchestrator() -> OracleOrchestrator {
        let graph = SemanticGraph::from_edges([
            SemanticEdge::semantic("A", "B", 0.8),
            SemanticEdge::citation("B", "C", 0.9),
        ]);
        let oracle = OracleOrchestrator::new(OracleConfig::default(), graph).unwrap();
        oracle.router().add_context(ContextEntry::new(
            "A relates to B",
            ContextLayer::Language,
            vec![1.0, 0.0],
            "en",
        ));
        oracle
    }

    #[test]
    fn test_evaluate_rendered_path() {
        let oracle = make_orchestrator();
        let query = OracleQuery::new(ContextQuery::new(vec![1.0, 0.0], "en"), "A", "C");
        let report = oracle.evaluate(&query);

        assert_eq!(report.repair.original_text, "A -> B -> C");
        // The path mentions its own entities.
        assert_eq!(report.repair.hallucination, None);
        assert_eq!(report.metrics.reliability, 1.0);
        assert_eq!(report.metrics.hallucination_rate, 0.0);
        assert_eq!(report.metrics.routed_entries, 1);
        assert!(report.merged_context.starts_with("[language|1.000]"));
        assert_eq!(report.config_hash, oracle.config_hash());
        assert!(!report.traversal.citations.is_empty());
    }

    #[test]
    fn test_evaluate_flags_candidate() {
        let oracle = make_orchestrator();
        let query = OracleQuery::new(ContextQuery::new(vec![1.0, 0.0], "en"), "A", "C")
            .with_candidate_text("Research shows this is true");
        let report = oracle.evaluate(&query);

        assert_eq!(report.metrics.edits_flagged, 1);
        assert!((report.metrics.hallucination_rate - 0.2).abs() < 1e-6);
        assert!((report.metrics.reliability - 0.9).abs() < 1e-6);
        assert_eq!(report.repair.edits[0].provenance.as_deref(), Some(TRAVERSAL_SOURCE));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = OracleConfig::default();
        config.memory.short_term_capacity = 0;
        assert!(OracleOrchestrator::new(config, SemanticGraph::new()).is_err());
    }
}
