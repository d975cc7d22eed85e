//! Routing policy: similarity thresholds and context budget.

use serde::{Deserialize, Serialize};

use super::{quantize_float, ConfigError};
use crate::canonical::canonical_hash_hex;

/// Parameters of the context router.
///
/// ## Parameters
///
/// - `base_threshold`: starting similarity bar before layer and query adjustments
/// - `min_threshold` / `max_threshold`: clamp range of every adjusted threshold
/// - `default_top_k`: matches kept per layer when the query does not say
/// - `max_context_tokens`: budget of the merged context (approximate tokens)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingPolicy {
    /// Base similarity threshold.
    pub base_threshold: f32,
    /// Lower clamp bound.
    pub min_threshold: f32,
    /// Upper clamp bound.
    pub max_threshold: f32,
    /// Matches per layer.
    pub default_top_k: usize,
    /// Merged context budget.
    pub max_context_tokens: usize,
}

impl RoutingPolicy {
    /// Create a policy with custom thresholds.
    pub fn new(base_threshold: f32, min_threshold: f32, max_threshold: f32) -> Self {
        Self {
            base_threshold,
            min_threshold,
            max_threshold,
            ..Self::default()
        }
    }

    /// Check threshold bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [self.base_threshold, self.min_threshold, self.max_threshold]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.min_threshold > self.max_threshold {
            return Err(ConfigError::ThresholdBounds {
                min: self.min_threshold,
                max: self.max_threshold,
            });
        }
        if !(self.min_threshold..=self.max_threshold).contains(&self.base_threshold) {
            return Err(ConfigError::BaseThresholdOutOfBounds {
                base: self.base_threshold,
                min: self.min_threshold,
                max: self.max_threshold,
            });
        }
        if self.default_top_k == 0 {
            return Err(ConfigError::ZeroLimit("routing.default_top_k"));
        }
        Ok(())
    }

    /// Hash of the quantized parameters.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(&self.to_quantized())
    }

    pub(super) fn to_quantized(&self) -> QuantizedRoutingPolicy {
        QuantizedRoutingPolicy {
            base_threshold: quantize_float(self.base_threshold),
            min_threshold: quantize_float(self.min_threshold),
            max_threshold: quantize_float(self.max_threshold),
            default_top_k: self.default_top_k,
            max_context_tokens: self.max_context_tokens,
        }
    }
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            base_threshold: 0.80,
            min_threshold: 0.70,
            max_threshold: 0.95,
            default_top_k: 5,
            max_context_tokens: 2048,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(super) struct QuantizedRoutingPolicy {
    base_threshold: i64,
    min_threshold: i64,
    max_threshold: i64,
    default_top_k: usize,
    max_context_tokens: usize,
}
