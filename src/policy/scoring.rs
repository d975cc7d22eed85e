//! Threshold adjustment and ranking for context routing.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

use super::routing::RoutingPolicy;
use crate::types::{ContextEntry, ContextLayer};

/// Threshold offset for the global layer (harder to match).
pub const GLOBAL_LAYER_OFFSET: f32 = 0.05;
/// Threshold offset for the language layer (easier to match).
pub const LANGUAGE_LAYER_OFFSET: f32 = -0.05;
/// Threshold change per unit of complexity away from 0.5.
pub const COMPLEXITY_GAIN: f32 = 0.1;
/// Threshold reduction when the language matches.
pub const LANGUAGE_MATCH_BONUS: f32 = 0.03;

/// Compute the similarity threshold for one layer.
///
/// Formula:
/// ```text
/// threshold = base + layer_offset + (complexity - 0.5) * 0.1 - (language_match ? 0.03 : 0)
/// ```
/// clamped to `[min_threshold, max_threshold]`. Complexity is clamped to
/// [0, 1] first; a non-finite complexity counts as neutral (0.5).
///
/// Never panics. With inverted bounds the result is `max_threshold`, and a
/// NaN bound is ignored.
pub fn adjusted_threshold(
    policy: &RoutingPolicy,
    layer: ContextLayer,
    query_complexity: f32,
    language_match: bool,
) -> f32 {
    let complexity = if query_complexity.is_finite() {
        query_complexity.clamp(0.0, 1.0)
    } else {
        0.5
    };

    let layer_offset = match layer {
        ContextLayer::Global => GLOBAL_LAYER_OFFSET,
        ContextLayer::Domain => 0.0,
        ContextLayer::Language => LANGUAGE_LAYER_OFFSET,
    };

    let mut threshold = policy.base_threshold + layer_offset;
    threshold += (complexity - 0.5) * COMPLEXITY_GAIN;
    if language_match {
        threshold -= LANGUAGE_MATCH_BONUS;
    }

    threshold.max(policy.min_threshold).min(policy.max_threshold)
}

/// A context entry paired with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntry {
    /// Matched entry.
    pub entry: Arc<ContextEntry>,
    /// Cosine similarity to the query.
    pub similarity: f32,
}

impl ScoredEntry {
    /// Create a scored entry.
    pub fn new(entry: Arc<ContextEntry>, similarity: f32) -> Self {
        Self { entry, similarity }
    }

    /// Descending order by similarity.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other.similarity.total_cmp(&self.similarity)
    }
}

/// Sort descending by similarity and keep the first `top_k`.
///
/// The sort is stable, so equal similarities keep insertion order.
pub fn rank_top_k(mut scored: Vec<ScoredEntry>, top_k: usize) -> Vec<ScoredEntry> {
    scored.sort_by(ScoredEntry::rank_cmp);
    scored.truncate(top_k);
    scored
}
