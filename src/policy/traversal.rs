//! Traversal policy: candidate enumeration, penalties and solver budget.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{quantize_float, ConfigError};
use crate::canonical::canonical_hash_hex;
use crate::types::TraversalMethod;

/// Largest accepted `max_candidate_paths`.
pub const MAX_CANDIDATE_PATHS: usize = 1024;

/// Which traversal strategy `traverse` uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalMode {
    /// Enumerate candidates and let the solver backend pick one.
    Optimized,
    /// Weighted shortest path only.
    Classical,
}

impl TraversalMode {
    /// The method reported in traversal results.
    pub fn method(&self) -> TraversalMethod {
        match self {
            Self::Optimized => TraversalMethod::Optimized,
            Self::Classical => TraversalMethod::Classical,
        }
    }
}

impl Default for TraversalMode {
    fn default() -> Self {
        Self::Optimized
    }
}

/// Parameters of the graph traversal engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalPolicy {
    /// Traversal strategy.
    pub mode: TraversalMode,
    /// Maximum candidate paths handed to the solver.
    pub max_candidate_paths: usize,
    /// Maximum hops of an enumerated candidate path.
    pub path_cutoff: usize,
    /// Coherence contribution of a hop between non-adjacent nodes.
    pub virtual_hop_penalty: f32,
    /// Depth of the citation walk from the terminal node.
    pub citation_depth: usize,
    /// Solver budget in milliseconds.
    pub solver_timeout_ms: u64,
    /// Depth hint forwarded to the solver backend.
    pub num_layers: usize,
}

impl TraversalPolicy {
    /// Policy with the classical mode.
    pub fn classical() -> Self {
        Self {
            mode: TraversalMode::Classical,
            ..Self::default()
        }
    }

    /// Solver budget as a `Duration`.
    pub fn solver_timeout(&self) -> Duration {
        Duration::from_millis(self.solver_timeout_ms)
    }

    /// Check limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_candidate_paths == 0 {
            return Err(ConfigError::ZeroLimit("traversal.max_candidate_paths"));
        }
        if self.max_candidate_paths > MAX_CANDIDATE_PATHS {
            return Err(ConfigError::LimitExceeded {
                field: "traversal.max_candidate_paths",
                value: self.max_candidate_paths,
                max: MAX_CANDIDATE_PATHS,
            });
        }
        if self.path_cutoff == 0 {
            return Err(ConfigError::ZeroLimit("traversal.path_cutoff"));
        }
        if self.solver_timeout_ms == 0 {
            return Err(ConfigError::ZeroLimit("traversal.solver_timeout_ms"));
        }
        if !(0.0..=1.0).contains(&self.virtual_hop_penalty) {
            return Err(ConfigError::OutOfUnitRange {
                field: "traversal.virtual_hop_penalty",
                value: self.virtual_hop_penalty,
            });
        }
        Ok(())
    }

    /// Hash of the quantized parameters.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(&self.to_quantized())
    }

    pub(super) fn to_quantized(&self) -> QuantizedTraversalPolicy {
        QuantizedTraversalPolicy {
            mode: self.mode,
            max_candidate_paths: self.max_candidate_paths,
            path_cutoff: self.path_cutoff,
            virtual_hop_penalty: quantize_float(self.virtual_hop_penalty),
            citation_depth: self.citation_depth,
            solver_timeout_ms: self.solver_timeout_ms,
            num_layers: self.num_layers,
        }
    }
}

impl Default for TraversalPolicy {
    fn default() -> Self {
        Self {
            mode: TraversalMode::Optimized,
            max_candidate_paths: 10,
            path_cutoff: 5,
            virtual_hop_penalty: 0.1,
            citation_depth: 2,
            solver_timeout_ms: 2_000,
            num_layers: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(super) struct QuantizedTraversalPolicy {
    mode: TraversalMode,
    max_candidate_paths: usize,
    path_cutoff: usize,
    virtual_hop_penalty: i64,
    citation_depth: usize,
    solver_timeout_ms: u64,
    num_layers: usize,
}
