//! Memory policy for the repair stream.

use serde::{Deserialize, Serialize};

use super::{quantize_float, ConfigError};
use crate::canonical::canonical_hash_hex;

/// Parameters of the dual-tier edit memory and the correction edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryPolicy {
    /// Maximum short-term entries.
    pub short_term_capacity: usize,
    /// Maximum long-term entries.
    pub long_term_capacity: usize,
    /// Entries strictly above this reliability are promoted on overflow.
    pub promotion_threshold: f32,
    /// Confidence attached to synthesized corrections.
    pub correction_confidence: f32,
    /// Reliability lost per applied edit.
    pub reliability_penalty_per_edit: f32,
    /// Marker prefixed to corrected text.
    pub correction_marker: String,
}

impl MemoryPolicy {
    /// Policy with custom capacities.
    pub fn with_capacities(short_term_capacity: usize, long_term_capacity: usize) -> Self {
        Self {
            short_term_capacity,
            long_term_capacity,
            ..Self::default()
        }
    }

    /// Check capacities and unit-range fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.short_term_capacity == 0 {
            return Err(ConfigError::ZeroLimit("memory.short_term_capacity"));
        }
        if self.long_term_capacity == 0 {
            return Err(ConfigError::ZeroLimit("memory.long_term_capacity"));
        }
        for (field, value) in [
            ("memory.promotion_threshold", self.promotion_threshold),
            ("memory.correction_confidence", self.correction_confidence),
            ("memory.reliability_penalty_per_edit", self.reliability_penalty_per_edit),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { field, value });
            }
        }
        Ok(())
    }

    /// Hash of the quantized parameters.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(&self.to_quantized())
    }

    pub(super) fn to_quantized(&self) -> QuantizedMemoryPolicy {
        QuantizedMemoryPolicy {
            short_term_capacity: self.short_term_capacity,
            long_term_capacity: self.long_term_capacity,
            promotion_threshold: quantize_float(self.promotion_threshold),
            correction_confidence: quantize_float(self.correction_confidence),
            reliability_penalty_per_edit: quantize_float(self.reliability_penalty_per_edit),
            correction_marker: self.correction_marker.clone(),
        }
    }
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self {
            short_term_capacity: 100,
            long_term_capacity: 1000,
            promotion_threshold: 0.8,
            correction_confidence: 0.85,
            reliability_penalty_per_edit: 0.1,
            correction_marker: "[CORRECTED]".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(super) struct QuantizedMemoryPolicy {
    short_term_capacity: usize,
    long_term_capacity: usize,
    promotion_threshold: i64,
    correction_confidence: i64,
    reliability_penalty_per_edit: i64,
    correction_marker: String,
}
