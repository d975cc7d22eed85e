//! End-to-end tests: graph loading, config loading, the oracle pipeline and
//! the report store.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use evaluation_oracle::{
    ContextEntry, ContextLayer, ContextQuery, GraphTraversalEngine, HallucinationType,
    JsonGraphSource, LayerBalanceAnalyzer, OracleConfig, OracleOrchestrator, OracleQuery,
    RepairContext, ReportStore, Selection, SelectionProblem, SelectionSolver, SemanticGraph,
    SolverError, TextQualityOracle, TraversalMethod, TraversalMode,
};

const GRAPH_JSON: &str = r#"{
    "nodes": ["A", "B", "C", "lonely"],
    "edges": [
        {"source": "A", "target": "B", "weight": 0.8, "type": "semantic"},
        {"source": "B", "target": "C", "weight": 0.9, "type": "citation"},
        {"source": "A", "target": "C", "weight": 0.6, "type": "semantic"}
    ]
}"#;

fn load_graph() -> SemanticGraph {
    let source = JsonGraphSource::from_json_str(GRAPH_JSON).unwrap();
    SemanticGraph::from_source(&source).unwrap()
}

fn make_oracle(config: OracleConfig) -> OracleOrchestrator {
    let oracle = OracleOrchestrator::new(config, load_graph()).unwrap();
    let router = oracle.router();
    router.add_context(ContextEntry::new("Qubits encode state", ContextLayer::Global, vec![0.9, 0.1, 0.0], "en"));
    router.add_context(
        ContextEntry::new("Quantum annealing basics", ContextLayer::Domain, vec![0.8, 0.2, 0.0], "en")
            .with_domain("quantum"),
    );
    router.add_context(ContextEntry::new("Los cúbits codifican estado", ContextLayer::Language, vec![1.0, 0.0, 0.0], "es"));
    oracle
}

fn make_query(language: &str) -> OracleQuery {
    OracleQuery::new(
        ContextQuery::new(vec![1.0, 0.0, 0.0], language).with_domain("quantum"),
        "A",
        "C",
    )
}

struct StalledSolver;

impl SelectionSolver for StalledSolver {
    fn name(&self) -> &str {
        "stalled"
    }

    fn solve(&self, _: &SelectionProblem, _: Duration) -> Result<Selection, SolverError> {
        thread::sleep(Duration::from_millis(300));
        Err(SolverError::Timeout(Duration::from_millis(300)))
    }
}

struct StrictOracle;

impl TextQualityOracle for StrictOracle {
    fn detect_hallucination(&self, _: &str, _: &RepairContext) -> Option<HallucinationType> {
        Some(HallucinationType::FactualError)
    }

    fn grounding(&self, _: &str, _: &str) -> f32 {
        0.0
    }
}

#[test]
fn test_json_graph_to_traversal() {
    let engine = GraphTraversalEngine::from_source(
        &JsonGraphSource::from_json_str(GRAPH_JSON).unwrap(),
        Default::default(),
    )
    .unwrap();

    assert_eq!(engine.graph().node_count(), 4);
    let result = engine.traverse(&"A".into(), &"C".into(), true);
    assert_eq!(result.render_path(), "A -> B -> C");
    assert_eq!(result.method, TraversalMethod::Optimized);
    assert!(!result.fell_back);
}

#[test]
fn test_pipeline_report() {
    let oracle = make_oracle(OracleConfig::default());
    let report = oracle.evaluate(&make_query("es"));

    assert_eq!(report.language, "es");
    assert_eq!(report.metrics.routed_entries, 3);
    assert!(report.merged_context.starts_with("[language|"));
    assert_eq!(report.traversal.render_path(), "A -> B -> C");
    assert_eq!(report.metrics.coherence, report.traversal.coherence);
    assert_eq!(report.metrics.edits_flagged, 0);
    assert!(report.metrics.total_latency_ms >= report.metrics.traversal_latency_ms);
    assert!((0.0..=1.0).contains(&report.metrics.grounding));
}

#[test]
fn test_pipeline_language_mismatch() {
    let oracle = make_oracle(OracleConfig::default());
    let report = oracle.evaluate(&make_query("en"));

    assert!(report.routed.get(ContextLayer::Language).is_empty());
    assert_eq!(report.metrics.routed_entries, 2);
}

#[test]
fn test_pipeline_flags_unsupported_candidate() {
    let oracle = make_oracle(OracleConfig::default());
    let query = make_query("en").with_candidate_text("Research shows qubits never decohere");
    let report = oracle.evaluate(&query);

    assert_eq!(report.repair.hallucination, Some(HallucinationType::UnsupportedClaim));
    assert!(report.repair.edited_text.starts_with("[CORRECTED] "));
    assert!((report.metrics.hallucination_rate - 1.0 / 5.0).abs() < 1e-6);

    let id = report.repair.edits[0].id;
    let provenance = oracle.stream().get_edit_provenance(id).unwrap();
    assert_eq!(provenance.edit.provenance.as_deref(), Some("graph_traversal"));
}

#[test]
fn test_stalled_solver_falls_back_within_budget() {
    let mut config = OracleConfig::default();
    config.traversal.solver_timeout_ms = 25;
    let oracle = make_oracle(config).with_solver(Arc::new(StalledSolver));

    let report = oracle.evaluate(&make_query("en"));
    assert!(report.traversal.fell_back);
    assert_eq!(report.traversal.method, TraversalMethod::Optimized);
    assert_eq!(report.traversal.render_path(), "A -> C");
}

#[test]
fn test_custom_quality_oracle() {
    let oracle = make_oracle(OracleConfig::default()).with_quality_oracle(Arc::new(StrictOracle));
    let report = oracle.evaluate(&make_query("en"));

    assert_eq!(report.repair.hallucination, Some(HallucinationType::FactualError));
    assert_eq!(report.metrics.grounding, 0.0);
    let stats = oracle.stream().get_statistics();
    assert_eq!(stats.hallucination_counts[&HallucinationType::FactualError], 1);
}

#[test]
fn test_config_from_json() {
    let config = OracleConfig::from_json_str(
        r#"{"traversal": {"mode": "classical"}, "memory": {"short_term_capacity": 3}}"#,
    )
    .unwrap();
    assert_eq!(config.traversal.mode, TraversalMode::Classical);
    assert_eq!(config.memory.short_term_capacity, 3);
    assert_eq!(config.memory.long_term_capacity, 1000);

    let oracle = make_oracle(config);
    let report = oracle.evaluate(&make_query("en"));
    assert_eq!(report.traversal.method, TraversalMethod::Classical);
    assert_ne!(report.config_hash, OracleConfig::default().params_hash());
}

#[test]
fn test_config_from_path() {
    let path = std::env::temp_dir().join(format!("oracle-config-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, r#"{"routing": {"base_threshold": 0.9}}"#).unwrap();

    let config = OracleConfig::from_path(&path).unwrap();
    assert!((config.routing.base_threshold - 0.9).abs() < 1e-6);
    std::fs::remove_file(&path).unwrap();

    assert!(OracleConfig::from_path(&path).is_err());
}

#[test]
fn test_invalid_config_rejected() {
    assert!(OracleConfig::from_json_str(r#"{"routing": {"min_threshold": 0.9, "max_threshold": 0.8}}"#).is_err());

    let mut config = OracleConfig::default();
    config.traversal.path_cutoff = 0;
    assert!(OracleOrchestrator::new(config, SemanticGraph::new()).is_err());
}

#[test]
fn test_report_store_round_trip() {
    let oracle = make_oracle(OracleConfig::default());
    let store = ReportStore::new();

    let clean = oracle.evaluate_into(&make_query("en"), &store);
    let flagged = oracle.evaluate_into(&make_query("en").with_candidate_text("Research shows it"), &store);

    assert_eq!(store.len(), 2);
    assert_eq!(store.get(&clean.run_id).unwrap(), clean);

    let mut listed: Vec<_> = store.list().into_iter().map(|r| r.run_id).collect();
    let mut expected = vec![clean.run_id, flagged.run_id];
    listed.sort();
    expected.sort();
    assert_eq!(listed, expected);

    let summary = store.summary();
    assert_eq!(summary.runs, 2);
    assert!((summary.mean_reliability - 0.95).abs() < 1e-6);

    let json = serde_json::to_string(&store.get(&flagged.run_id).unwrap()).unwrap();
    assert!(json.contains("\"unsupported_claim\""));
}

#[test]
fn test_concurrent_evaluations_share_stream() {
    let oracle = Arc::new(make_oracle(OracleConfig::from_json_str(
        r#"{"memory": {"short_term_capacity": 10, "long_term_capacity": 20}}"#,
    )
    .unwrap()));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let oracle = Arc::clone(&oracle);
            thread::spawn(move || {
                for i in 0..25 {
                    let query = make_query("en").with_candidate_text(format!("Research shows {t}-{i}"));
                    oracle.evaluate(&query);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = oracle.stream().get_statistics();
    assert_eq!(stats.total_edits, 100);
    assert!(stats.short_term_entries <= 10);
    assert!(stats.long_term_entries <= 20);
}

#[test]
fn test_balance_gate_over_oracle_router() {
    let oracle = make_oracle(OracleConfig::default());
    let analyzer = LayerBalanceAnalyzer::default().with_capacity(5);

    let results = analyzer.analyze_all(oracle.router());
    assert!(results.values().all(|m| m.entry_count == 1));
    assert!(results.values().all(|m| (m.density - 0.2).abs() < 1e-6));
    assert!(analyzer.validate(oracle.router()));

    assert_eq!(oracle.router().clear_layer(ContextLayer::Global), 1);
    assert!(!analyzer.validate(oracle.router()));
}
