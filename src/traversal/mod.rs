//! Path selection over the semantic graph.

pub mod engine;
pub mod solver;

pub use engine::GraphTraversalEngine;
pub use solver::{ExhaustiveSolver, Selection, SelectionProblem, SelectionSolver, SolverError};
