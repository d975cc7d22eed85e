//! Layer balance quality gate.
//!
//! Measures how full and how redundant each context layer is.
//!
//! ## Metrics
//!
//! ```text
//! density       = entries / capacity
//! redundancy    = pairs with similarity >= 0.95 / all pairs   (0.0 below two entries)
//! balance_score = 0.6 * max(0, 1 - |density - 0.3| / 0.3)
//!               + 0.4 * max(0, 1 - redundancy / 0.12)
//! passes        = redundancy <= 0.12 && 0.1 <= density <= 0.5
//! ```
//!
//! Redundancy compares every pair, O(n^2) per layer.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::sync::Arc;

use crate::router::ContextRouter;
use crate::similarity::similarity;
use crate::types::{ContextEntry, ContextLayer};

/// Density with the best balance score.
pub const OPTIMAL_DENSITY: f32 = 0.3;
/// Weight of the density term in the balance score.
pub const DENSITY_WEIGHT: f32 = 0.6;
/// Weight of the redundancy term in the balance score.
pub const REDUNDANCY_WEIGHT: f32 = 0.4;

/// Balance metrics of one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerBalanceMetrics {
    /// Layer measured.
    pub layer: ContextLayer,
    /// Entries in the layer.
    pub entry_count: usize,
    /// Share of capacity used.
    pub density: f32,
    /// Share of entry pairs that are near-duplicates.
    pub redundancy: f32,
    /// Entries whose canonical content repeats an earlier entry.
    pub duplicate_entries: usize,
    /// Combined score in [0, 1], higher is better.
    pub balance_score: f32,
    /// Whether the layer is within the gate's limits.
    pub passes: bool,
}

/// Analyzer with configurable gate limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerBalanceAnalyzer {
    /// Nominal entries per layer.
    pub capacity: usize,
    /// Similarity at which a pair counts as redundant.
    pub similarity_threshold: f32,
    /// Maximum redundancy that passes.
    pub redundancy_threshold: f32,
    /// Minimum density that passes.
    pub min_density: f32,
    /// Maximum density that passes.
    pub max_density: f32,
}

impl Default for LayerBalanceAnalyzer {
    fn default() -> Self {
        Self {
            capacity: 1000,
            similarity_threshold: 0.95,
            redundancy_threshold: 0.12,
            min_density: 0.1,
            max_density: 0.5,
        }
    }
}

impl LayerBalanceAnalyzer {
    /// Set the nominal capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Share of capacity used by `entry_count` entries.
    pub fn density(&self, entry_count: usize) -> f32 {
        if self.capacity == 0 {
            return 0.0;
        }
        entry_count as f32 / self.capacity as f32
    }

    /// Share of entry pairs at or above the similarity threshold.
    pub fn redundancy(&self, entries: &[Arc<ContextEntry>]) -> f32 {
        if entries.len() < 2 {
            return 0.0;
        }

        let mut redundant = 0usize;
        let mut total = 0usize;
        for (i, a) in entries.iter().enumerate() {
            for b in &entries[i + 1..] {
                total += 1;
                if similarity(&a.embedding, &b.embedding) >= self.similarity_threshold {
                    redundant += 1;
                }
            }
        }

        redundant as f32 / total as f32
    }

    /// Combined balance score.
    pub fn balance_score(&self, density: f32, redundancy: f32) -> f32 {
        let density_score = (1.0 - (density - OPTIMAL_DENSITY).abs() / OPTIMAL_DENSITY).max(0.0);
        let redundancy_score = if self.redundancy_threshold > 0.0 {
            (1.0 - redundancy / self.redundancy_threshold).max(0.0)
        } else if redundancy == 0.0 {
            1.0
        } else {
            0.0
        };
        DENSITY_WEIGHT * density_score + REDUNDANCY_WEIGHT * redundancy_score
    }

    /// Metrics for a set of entries belonging to `layer`.
    pub fn analyze_entries(&self, layer: ContextLayer, entries: &[Arc<ContextEntry>]) -> LayerBalanceMetrics {
        let density = self.density(entries.len());
        let redundancy = self.redundancy(entries);

        let mut seen = BTreeSet::new();
        let duplicate_entries = entries
            .iter()
            .filter(|e| !seen.insert(e.content_hash.as_str()))
            .count();

        LayerBalanceMetrics {
            layer,
            entry_count: entries.len(),
            density,
            redundancy,
            duplicate_entries,
            balance_score: self.balance_score(density, redundancy),
            passes: redundancy <= self.redundancy_threshold
                && (self.min_density..=self.max_density).contains(&density),
        }
    }

    /// Metrics for one layer of a router.
    pub fn analyze_layer(&self, router: &ContextRouter, layer: ContextLayer) -> LayerBalanceMetrics {
        self.analyze_entries(layer, &router.layer_entries(layer))
    }

    /// Metrics for every layer of a router.
    pub fn analyze_all(&self, router: &ContextRouter) -> BTreeMap<ContextLayer, LayerBalanceMetrics> {
        ContextLayer::ALL
            .iter()
            .map(|&layer| (layer, self.analyze_layer(router, layer)))
            .collect()
    }

    /// Whether every layer passes.
    pub fn validate(&self, router: &ContextRouter) -> bool {
        let results = self.analyze_all(router);
        let passed = results.values().all(|m| m.passes);
        if !passed {
            let failing: Vec<&str> = results
                .values()
                .filter(|m| !m.passes)
                .map(|m| m.layer.as_str())
                .collect();
            tracing::warn!(failing = ?failing, "context layer balance gate failed");
        }
        passed
    }

    /// Plain-text report of every layer.
    pub fn report(&self, router: &ContextRouter) -> String {
        let results = self.analyze_all(router);
        let rule = "=".repeat(60);
        let mut out = String::new();

        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "CONTEXT LAYER BALANCE REPORT");
        let _ = writeln!(out, "{rule}");

        for m in results.values() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Layer: {}", m.layer.as_str().to_uppercase());
            let _ = writeln!(out, "  Entry Count: {}", m.entry_count);
            let _ = writeln!(out, "  Duplicates: {}", m.duplicate_entries);
            let _ = writeln!(out, "  Density: {:.2}%", m.density * 100.0);
            let _ = writeln!(
                out,
                "  Redundancy: {:.2}% (threshold: {:.2}%)",
                m.redundancy * 100.0,
                self.redundancy_threshold * 100.0
            );
            let _ = writeln!(out, "  Balance Score: {:.3}", m.balance_score);
            let _ = writeln!(out, "  Status: {}", if m.passes { "PASS" } else { "FAIL" });
        }

        let all_pass = results.values().all(|m| m.passes);
        let _ = writeln!(out);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(
            out,
            "Overall Status: {}",
            if all_pass { "ALL LAYERS PASSED" } else { "SOME LAYERS FAILED" }
        );
        let _ = write!(out, "{rule}");
        out
    }
}
