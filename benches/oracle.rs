//! Performance benchmarks for the evaluation oracle.
//!
//! Run with: `cargo bench --bench oracle`
//!
//! ## Performance Targets
//!
//! | Operation | Target | Notes |
//! |-----------|--------|-------|
//! | Context routing | <5ms p99 | 1000 entries per layer, 64-dim |
//! | Optimized traversal | <50ms p99 | 10 candidates, exhaustive solver |
//! | Classical traversal | <1ms p99 | A* over the same graph |
//! | Repair stream | Linear scaling | Multi-threaded `apply_edits` |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::thread;

use evaluation_oracle::{
    ContextEntry, ContextLayer, ContextQuery, ContextRouter, EditRepairStream,
    GraphTraversalEngine, MemoryPolicy, NodeId, OracleConfig, OracleOrchestrator, OracleQuery,
    RepairContext, RoutingPolicy, SemanticEdge, SemanticGraph, TraversalPolicy,
};

const DIM: usize = 64;

/// Deterministic pseudo-embedding.
fn make_embedding(seed: usize) -> Vec<f32> {
    (0..DIM)
        .map(|i| (((seed * 31 + i * 17) % 97) as f32 / 97.0) - 0.5)
        .collect()
}

/// Router with `per_layer` entries in every layer.
fn make_router(per_layer: usize) -> ContextRouter {
    let router = ContextRouter::new(RoutingPolicy::default());
    for layer in ContextLayer::ALL {
        for i in 0..per_layer {
            router.add_context(ContextEntry::new(
                format!("{layer} entry {i}"),
                layer,
                make_embedding(i),
                "en",
            ));
        }
    }
    router
}

/// Grid graph of `side * side` nodes with alternating edge kinds.
fn make_grid(side: usize) -> SemanticGraph {
    let node = |r: usize, c: usize| format!("n{r}_{c}");
    let mut graph = SemanticGraph::new();
    for r in 0..side {
        for c in 0..side {
            let weight = 0.5 + ((r * side + c) % 5) as f32 / 10.0;
            if c + 1 < side {
                graph.add_edge(SemanticEdge::semantic(node(r, c), node(r, c + 1), weight));
            }
            if r + 1 < side {
                graph.add_edge(SemanticEdge::citation(node(r, c), node(r + 1, c), weight));
            }
        }
    }
    graph
}

/// Benchmark routing over populated layers.
fn bench_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_context");

    for per_layer in [10, 100, 1000] {
        let router = make_router(per_layer);
        let query = ContextQuery::new(make_embedding(7), "en");

        group.throughput(Throughput::Elements((per_layer * 3) as u64));
        group.bench_with_input(BenchmarkId::new("entries", per_layer), &query, |b, query| {
            b.iter(|| router.route_context(black_box(query)))
        });
    }

    group.finish();
}

/// Benchmark optimized against classical traversal.
fn bench_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("traverse");
    let start = NodeId::new("n0_0");

    for side in [3, 5, 8] {
        let graph = Arc::new(make_grid(side));
        let target = NodeId::new(format!("n{}_{}", side - 1, side - 1));

        let optimized = GraphTraversalEngine::new(Arc::clone(&graph), TraversalPolicy::default());
        let classical = GraphTraversalEngine::new(Arc::clone(&graph), TraversalPolicy::classical());

        group.bench_with_input(BenchmarkId::new("optimized", side), &target, |b, target| {
            b.iter(|| optimized.traverse(black_box(&start), black_box(target), true))
        });
        group.bench_with_input(BenchmarkId::new("classical", side), &target, |b, target| {
            b.iter(|| classical.traverse(black_box(&start), black_box(target), true))
        });
    }

    group.finish();
}

/// Benchmark repair stream throughput under contention.
fn bench_repair_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("repair_contention");
    let context = RepairContext::new().with_source("bench");

    for num_threads in [1, 2, 4, 8] {
        let stream = Arc::new(EditRepairStream::new(MemoryPolicy::default()));

        group.throughput(Throughput::Elements((num_threads * 100) as u64));
        group.bench_with_input(BenchmarkId::new("threads", num_threads), &num_threads, |b, &n| {
            b.iter(|| {
                let handles: Vec<_> = (0..n)
                    .map(|t| {
                        let stream = Arc::clone(&stream);
                        let context = context.clone();
                        thread::spawn(move || {
                            for i in 0..100 {
                                let text = format!("Research shows result {t}-{i}");
                                black_box(stream.apply_edits(&text, &context));
                            }
                        })
                    })
                    .collect();

                for handle in handles {
                    handle.join().unwrap();
                }
            })
        });
    }

    group.finish();
}

/// Benchmark one end-to-end evaluation.
fn bench_evaluate(c: &mut Criterion) {
    let oracle = OracleOrchestrator::new(OracleConfig::default(), make_grid(5)).unwrap();
    for i in 0..100 {
        oracle.router().add_context(ContextEntry::new(
            format!("fact {i}"),
            ContextLayer::Global,
            make_embedding(i),
            "en",
        ));
    }
    let query = OracleQuery::new(ContextQuery::new(make_embedding(3), "en"), "n0_0", "n4_4")
        .with_candidate_text("Research shows n0_0 leads to n4_4");

    c.bench_function("evaluate", |b| b.iter(|| oracle.evaluate(black_box(&query))));
}

criterion_group!(
    benches,
    bench_routing,
    bench_traversal,
    bench_repair_contention,
    bench_evaluate,
);
criterion_main!(benches);
