//! One-hot selection problems and solver backends.
//!
//! A [`SelectionProblem`] has one binary variable per candidate and a
//! linear objective:
//!
//! ```text
//! minimize   sum_i cost_i * x_i
//! subject to sum_i x_i == 1,  x_i in {0, 1}
//! ```
//!
//! Backends implement [`SelectionSolver`]. The engine treats every
//! [`SolverError`] (and a backend that never answers) as "no solution".

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::policy::MAX_CANDIDATE_PATHS;

/// Error returned by a solver backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    /// The backend ran out of time.
    #[error("Solver timed out after {0:?}")]
    Timeout(Duration),

    /// No assignment satisfies the constraint (e.g. no variables).
    #[error("Selection problem is infeasible")]
    Infeasible,

    /// The problem is too large for this backend.
    #[error("Too many variables: {count} (max {max})")]
    TooManyVariables {
        /// Variables in the problem.
        count: usize,
        /// Backend limit.
        max: usize,
    },

    /// The backend selected a variable that does not exist.
    #[error("Invalid selection index {index} for {len} variables")]
    InvalidSelection {
        /// Selected index.
        index: usize,
        /// Number of variables.
        len: usize,
    },

    /// Backend-specific failure.
    #[error("Solver backend error: {0}")]
    Backend(String),
}

/// Binary selection over a linear objective with a one-hot constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionProblem {
    /// Objective coefficient per variable.
    pub costs: Vec<f64>,
    /// Depth hint for layered backends. Ignored by exhaustive search.
    pub num_layers: usize,
}

impl SelectionProblem {
    /// Create a problem.
    pub fn new(costs: Vec<f64>, num_layers: usize) -> Self {
        Self { costs, num_layers }
    }

    /// Number of binary variables.
    pub fn len(&self) -> usize {
        self.costs.len()
    }

    /// Whether the problem has no variables.
    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    /// Objective value of an assignment, one flag per variable.
    pub fn objective(&self, assignment: &[bool]) -> f64 {
        self.costs
            .iter()
            .zip(assignment)
            .filter(|(_, &x)| x)
            .map(|(c, _)| c)
            .sum()
    }

    /// Whether an assignment satisfies the one-hot constraint.
    pub fn is_feasible(&self, assignment: &[bool]) -> bool {
        assignment.len() == self.len() && assignment.iter().filter(|&&x| x).count() == 1
    }

    /// The assignment that sets only `index`.
    pub fn one_hot(&self, index: usize) -> Vec<bool> {
        (0..self.len()).map(|i| i == index).collect()
    }
}

/// Solution of a [`SelectionProblem`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Index of the variable set to 1.
    pub index: usize,
    /// Objective value at the solution.
    pub objective: f64,
}

/// Strategy interface for combinatorial optimization backends.
///
/// Implementations must return within roughly `timeout`; the engine also
/// enforces the budget from the outside.
pub trait SelectionSolver: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Solve the problem.
    fn solve(&self, problem: &SelectionProblem, timeout: Duration) -> Result<Selection, SolverError>;
}

/// Exact backend enumerating the feasible assignments.
///
/// Under the one-hot constraint the feasible set is the `n` unit vectors,
/// and the objective at unit vector `i` is `cost_i`, so the search is a
/// linear scan. Ties go to the lowest index.
#[derive(Debug, Clone)]
pub struct ExhaustiveSolver {
    max_variables: usize,
}

impl ExhaustiveSolver {
    /// Default variable limit. Matches the largest accepted candidate limit.
    pub const DEFAULT_MAX_VARIABLES: usize = MAX_CANDIDATE_PATHS;

    /// Create a solver with a custom variable limit.
    pub fn new(max_variables: usize) -> Self {
        Self { max_variables }
    }
}

impl Default for ExhaustiveSolver {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_VARIABLES)
    }
}

impl SelectionSolver for ExhaustiveSolver {
    fn name(&self) -> &str {
        "exhaustive"
    }

    fn solve(&self, problem: &SelectionProblem, timeout: Duration) -> Result<Selection, SolverError> {
        let n = problem.len();
        if n == 0 {
            return Err(SolverError::Infeasible);
        }
        if n > self.max_variables {
            return Err(SolverError::TooManyVariables {
                count: n,
                max: self.max_variables,
            });
        }

        let deadline = Instant::now() + timeout;
        let mut best: Option<Selection> = None;

        for (index, &cost) in problem.costs.iter().enumerate() {
            if index % 1024 == 1023 && Instant::now() >= deadline {
                return Err(SolverError::Timeout(timeout));
            }
            match best {
                Some(b) if cost >= b.objective => {}
                _ => best = Some(Selection { index, objective: cost }),
            }
        }

        best.ok_or(SolverError::Infeasible)
    }
}
