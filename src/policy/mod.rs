//! Oracle configuration.
//!
//! ## Float Normalization for Deterministic Hashing
//!
//! Floats are quantized to integers (x 1e6, rounded to i64) before hashing,
//! so `params_hash` values are stable across platforms and serializers.

pub mod memory;
pub mod routing;
pub mod scoring;
pub mod traversal;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::canonical::canonical_hash_hex;

pub use memory::MemoryPolicy;
pub use routing::RoutingPolicy;
pub use scoring::{adjusted_threshold, ScoredEntry};
pub use traversal::{TraversalMode, TraversalPolicy, MAX_CANDIDATE_PATHS};

/// Quantization factor for float normalization.
const FLOAT_QUANTIZATION_FACTOR: f64 = 1_000_000.0;

/// Quantize a float to an i64 for deterministic hashing.
fn quantize_float(value: f32) -> i64 {
    ((value as f64) * FLOAT_QUANTIZATION_FACTOR).round() as i64
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Threshold bounds are inverted or not finite.
    #[error("Invalid threshold bounds: min {min} > max {max}")]
    ThresholdBounds {
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },
    /// Base threshold lies outside the bounds.
    #[error("Base threshold {base} outside [{min}, {max}]")]
    BaseThresholdOutOfBounds {
        /// Base threshold.
        base: f32,
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },
    /// A limit or capacity is zero.
    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),
    /// A limit is above what the crate supports.
    #[error("{field} is {value}, above the maximum of {max}")]
    LimitExceeded {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: usize,
        /// Largest accepted value.
        max: usize,
    },
    /// A value must lie in [0, 1].
    #[error("{field} must lie in [0, 1], got {value}")]
    OutOfUnitRange {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: f32,
    },
    /// Config document is not valid JSON for this schema.
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Config file could not be read.
    #[error("Config read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Complete oracle configuration.
///
/// Every section defaults independently, so a partial document such as
/// `{"memory": {"short_term_capacity": 10}}` is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Context router parameters.
    pub routing: RoutingPolicy,
    /// Graph traversal parameters.
    pub traversal: TraversalPolicy,
    /// Repair stream memory parameters.
    pub memory: MemoryPolicy,
}

#[derive(Serialize)]
struct QuantizedOracleConfig {
    routing: routing::QuantizedRoutingPolicy,
    traversal: traversal::QuantizedTraversalPolicy,
    memory: memory::QuantizedMemoryPolicy,
}

impl OracleConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.routing.validate()?;
        self.traversal.validate()?;
        self.memory.validate()
    }

    /// Hash of all quantized parameters.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(&QuantizedOracleConfig {
            routing: self.routing.to_quantized(),
            traversal: self.traversal.to_quantized(),
            memory: self.memory.to_quantized(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_fills_defaults() {
        let config = OracleConfig::from_json_str(
            r#"{"memory": {"short_term_capacity": 10}, "traversal": {"mode": "classical"}}"#,
        )
        .unwrap();

        assert_eq!(config.memory.short_term_capacity, 10);
        assert_eq!(config.memory.long_term_capacity, 1000);
        assert_eq!(config.traversal.mode, TraversalMode::Classical);
        assert_eq!(config.routing, RoutingPolicy::default());
    }

    #[test]
    fn test_invalid_document_rejected() {
        let err = OracleConfig::from_json_str(r#"{"routing": {"min_threshold": 0.9, "max_threshold": 0.8}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ThresholdBounds { .. }));

        let err = OracleConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = OracleConfig::from_path("/nonexistent/oracle.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_params_hash_determinism() {
        let c1 = OracleConfig::default();
        let mut c2 = OracleConfig::default();
        assert_eq!(c1.params_hash(), c2.params_hash());

        c2.memory.short_term_capacity = 50;
        assert_ne!(c1.params_hash(), c2.params_hash());
    }

    #[test]
    fn test_roundtrip_json() {
        let config = OracleConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = OracleConfig::from_json_str(&json).unwrap();
        assert_eq!(config, parsed);
    }
}
