//! Graph traversal engine.
//!
//! ## Algorithm
//!
//! Optimized traversal:
//! 1. Short-circuit `start == target`, unknown endpoints and unreachable
//!    targets to `([start], 0.0)`.
//! 2. Enumerate simple paths (at most `path_cutoff` hops) and keep the first
//!    `max_candidate_paths`.
//! 3. Score each candidate as `len * (1 - coherence)` and hand the costs to
//!    the solver backend as a one-hot selection problem.
//! 4. Any solver error, timeout or out-of-range answer falls back to the
//!    classical traversal.
//!
//! Classical traversal is A* with a zero heuristic over edge costs of
//! `1 / (weight + 0.01)`.

use petgraph::algo::{all_simple_paths, astar, has_path_connecting};
use petgraph::graph::NodeIndex;
use std::collections::{BTreeSet, VecDeque};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;

use super::solver::{ExhaustiveSolver, Selection, SelectionProblem, SelectionSolver, SolverError};
use crate::graph::{GraphError, SemanticGraph};
use crate::policy::{TraversalMode, TraversalPolicy};
use crate::store::GraphSource;
use crate::types::{EdgeKind, NodeId, TraversalResult};

/// Path finder over an immutable semantic graph.
///
/// Stateless per call; traversals for different endpoint pairs can run in
/// parallel on a shared engine.
pub struct GraphTraversalEngine {
    graph: Arc<SemanticGraph>,
    policy: TraversalPolicy,
    solver: Arc<dyn SelectionSolver>,
}

struct Routed {
    path: Vec<NodeId>,
    cost: f64,
    fell_back: bool,
}

impl GraphTraversalEngine {
    /// Create an engine with the exhaustive solver backend.
    pub fn new(graph: impl Into<Arc<SemanticGraph>>, policy: TraversalPolicy) -> Self {
        Self {
            graph: graph.into(),
            policy,
            solver: Arc::new(ExhaustiveSolver::default()),
        }
    }

    /// Build the graph from a source and create an engine.
    pub fn from_source<S: GraphSource>(source: &S, policy: TraversalPolicy) -> Result<Self, GraphError> {
        Ok(Self::new(SemanticGraph::from_source(source)?, policy))
    }

    /// Replace the solver backend.
    pub fn with_solver(mut self, solver: Arc<dyn SelectionSolver>) -> Self {
        self.solver = solver;
        self
    }

    /// The graph.
    pub fn graph(&self) -> &SemanticGraph {
        &self.graph
    }

    /// The traversal policy.
    pub fn policy(&self) -> &TraversalPolicy {
        &self.policy
    }

    /// Mean edge weight along `path`.
    ///
    /// A hop between non-adjacent nodes contributes the virtual hop penalty.
    /// Returns 0.0 for an empty path and 1.0 for a single node.
    pub fn compute_coherence(&self, path: &[NodeId]) -> f32 {
        match path.len() {
            0 => return 0.0,
            1 => return 1.0,
            _ => {}
        }

        let total: f64 = path
            .windows(2)
            .map(|pair| match self.graph.edge(&pair[0], &pair[1]) {
                Some(data) => data.weight as f64,
                None => self.policy.virtual_hop_penalty as f64,
            })
            .sum();

        ((total / (path.len() - 1) as f64) as f32).clamp(0.0, 1.0)
    }

    /// Breadth-first walk over citation edges from `start`.
    ///
    /// Visits each node once, at most `max_depth` hops away, and returns
    /// nodes in visitation order starting with `start`. Neighbors are
    /// expanded in node id order.
    pub fn citation_walk(&self, start: &NodeId, max_depth: usize) -> Vec<NodeId> {
        let mut visited: BTreeSet<NodeId> = BTreeSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();

        visited.insert(start.clone());
        queue.push_back((start.clone(), 0usize));

        while let Some((node, depth)) = queue.pop_front() {
            order.push(node.clone());
            if depth >= max_depth {
                continue;
            }
            for (neighbor, data) in self.graph.neighbors(&node) {
                if data.kind == EdgeKind::Citation && visited.insert(neighbor.clone()) {
                    queue.push_back((neighbor, depth + 1));
                }
            }
        }

        order
    }

    /// Candidate simple paths from `start` to `target`, in enumeration order.
    pub fn candidate_paths(&self, start: &NodeId, target: &NodeId) -> Vec<Vec<NodeId>> {
        let (Some(s), Some(t)) = (self.graph.index_of(start), self.graph.index_of(target)) else {
            return Vec::new();
        };
        let max_intermediate = self.policy.path_cutoff.saturating_sub(1);

        all_simple_paths::<Vec<NodeIndex>, _>(self.graph.inner(), s, t, 0, Some(max_intermediate))
            .take(self.policy.max_candidate_paths)
            .map(|path| self.to_ids(&path))
            .collect()
    }

    /// Select a path by one-hot optimization over candidate paths.
    ///
    /// Falls back to [`classical_traversal`](Self::classical_traversal) when
    /// the solver fails.
    pub fn optimized_traversal(&self, start: &NodeId, target: &NodeId, num_layers: usize) -> (Vec<NodeId>, f64) {
        let routed = self.optimized(start, target, num_layers);
        (routed.path, routed.cost)
    }

    /// Weighted shortest path. Returns `([start], 0.0)` if unreachable.
    pub fn classical_traversal(&self, start: &NodeId, target: &NodeId) -> (Vec<NodeId>, f64) {
        let degenerate = (vec![start.clone()], 0.0);
        let (Some(s), Some(t)) = (self.graph.index_of(start), self.graph.index_of(target)) else {
            return degenerate;
        };

        match astar(
            self.graph.inner(),
            s,
            |n| n == t,
            |e| e.weight().traversal_cost(),
            |_| 0.0,
        ) {
            Some((_, indices)) => {
                let path = self.to_ids(&indices);
                let cost = self.path_cost(&path);
                (path, cost)
            }
            None => degenerate,
        }
    }

    /// Full traversal with the configured mode, optional citations and timing.
    pub fn traverse(&self, start: &NodeId, target: &NodeId, use_citations: bool) -> TraversalResult {
        let started = Instant::now();

        let routed = match self.policy.mode {
            TraversalMode::Optimized => self.optimized(start, target, self.policy.num_layers),
            TraversalMode::Classical => {
                let (path, cost) = self.classical_traversal(start, target);
                Routed {
                    path,
                    cost,
                    fell_back: false,
                }
            }
        };

        let citations = match (use_citations, routed.path.last()) {
            (true, Some(terminal)) => self.citation_walk(terminal, self.policy.citation_depth),
            _ => Vec::new(),
        };
        let coherence = self.compute_coherence(&routed.path);

        TraversalResult {
            path: routed.path,
            citations,
            cost: routed.cost,
            coherence,
            method: self.policy.mode.method(),
            fell_back: routed.fell_back,
            latency_ms: started.elapsed().as_secs_f64() * 1000.0,
        }
    }

    fn optimized(&self, start: &NodeId, target: &NodeId, num_layers: usize) -> Routed {
        let degenerate = Routed {
            path: vec![start.clone()],
            cost: 0.0,
            fell_back: false,
        };
        if start == target {
            return degenerate;
        }
        let (Some(s), Some(t)) = (self.graph.index_of(start), self.graph.index_of(target)) else {
            return degenerate;
        };
        if !has_path_connecting(self.graph.inner(), s, t, None) {
            return degenerate;
        }

        let mut candidates = self.candidate_paths(start, target);
        if candidates.is_empty() {
            tracing::debug!(
                start = %start,
                target = %target,
                cutoff = self.policy.path_cutoff,
                "no candidate path within cutoff, using classical traversal"
            );
            return self.fallback(start, target);
        }

        let costs: Vec<f64> = candidates.iter().map(|p| self.path_cost(p)).collect();
        let problem = SelectionProblem::new(costs, num_layers);

        match self.solve_with_timeout(problem) {
            Ok(selection) => {
                tracing::debug!(
                    solver = self.solver.name(),
                    candidates = candidates.len(),
                    selected = selection.index,
                    objective = selection.objective,
                    "solver selected path"
                );
                Routed {
                    path: candidates.swap_remove(selection.index),
                    cost: selection.objective,
                    fell_back: false,
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    solver = self.solver.name(),
                    start = %start,
                    target = %target,
                    "optimized traversal failed, falling back to classical"
                );
                self.fallback(start, target)
            }
        }
    }

    fn fallback(&self, start: &NodeId, target: &NodeId) -> Routed {
        let (path, cost) = self.classical_traversal(start, target);
        Routed {
            path,
            cost,
            fell_back: true,
        }
    }

    /// Run the backend on its own thread and wait at most the solver budget.
    fn solve_with_timeout(&self, problem: SelectionProblem) -> Result<Selection, SolverError> {
        let timeout = self.policy.solver_timeout();
        let len = problem.len();
        let solver = Arc::clone(&self.solver);
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name("oracle-solver".to_string())
            .spawn(move || {
                // The receiver may have given up already.
                let _ = tx.send(solver.solve(&problem, timeout));
            })
            .map_err(|e| SolverError::Backend(e.to_string()))?;

        let selection = match rx.recv_timeout(timeout) {
            Ok(result) => result?,
            Err(mpsc::RecvTimeoutError::Timeout) => return Err(SolverError::Timeout(timeout)),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(SolverError::Backend("solver exited without a result".to_string()))
            }
        };

        if selection.index >= len {
            return Err(SolverError::InvalidSelection {
                index: selection.index,
                len,
            });
        }
        Ok(selection)
    }

    fn path_cost(&self, path: &[NodeId]) -> f64 {
        path.len() as f64 * (1.0 - self.compute_coherence(path) as f64)
    }

    fn to_ids(&self, indices: &[NodeIndex]) -> Vec<NodeId> {
        indices.iter().map(|&i| self.graph.node_id(i).clone()).collect()
    }
}
