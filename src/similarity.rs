//! Vector similarity for routing and redundancy checks.

use crate::types::Embedding;

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when either vector has zero magnitude or the dimensions
/// differ, so routing stays total.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Cosine similarity between two embeddings.
#[inline]
pub fn similarity(a: &Embedding, b: &Embedding) -> f32 {
    cosine_similarity(a.as_slice(), b.as_slice())
}
