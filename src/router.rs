//! Hierarchical context router.
//!
//! Holds three append-only context layers and retrieves the best matches
//! for a query from each, using per-layer dynamic similarity thresholds.
//!
//! ## Concurrency
//!
//! Each layer sits behind its own `RwLock`. `add_context` takes the write
//! lock of one layer only; `route_context` takes read locks, so concurrent
//! routing calls never block each other and never observe a partial entry.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::policy::scoring::{adjusted_threshold, rank_top_k, ScoredEntry};
use crate::policy::RoutingPolicy;
use crate::similarity::similarity;
use crate::types::{ContextEntry, ContextLayer, Embedding};

/// A routing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextQuery {
    /// Query embedding.
    pub embedding: Embedding,
    /// Query language code.
    pub language: String,
    /// Optional domain filter for the domain layer.
    pub domain: Option<String>,
    /// Complexity in [0, 1].
    pub complexity: f32,
    /// Matches per layer; `None` uses the policy default.
    pub top_k: Option<usize>,
}

impl ContextQuery {
    /// Create a query with neutral complexity.
    pub fn new(embedding: impl Into<Embedding>, language: impl Into<String>) -> Self {
        Self {
            embedding: embedding.into(),
            language: language.into(),
            domain: None,
            complexity: 0.5,
            top_k: None,
        }
    }

    /// Restrict the domain layer to one domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the complexity.
    pub fn with_complexity(mut self, complexity: f32) -> Self {
        self.complexity = complexity;
        self
    }

    /// Set matches per layer.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }
}

/// Per-layer routing result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutedContext {
    /// Ranked matches per layer. Every layer is present, possibly empty.
    pub layers: BTreeMap<ContextLayer, Vec<ScoredEntry>>,
    /// Threshold applied to each layer.
    pub thresholds: BTreeMap<ContextLayer, f32>,
    /// Candidates considered per layer after language/domain filtering.
    pub candidates: BTreeMap<ContextLayer, usize>,
}

impl RoutedContext {
    /// Matches for one layer.
    pub fn get(&self, layer: ContextLayer) -> &[ScoredEntry] {
        self.layers.get(&layer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Matches across all layers.
    pub fn total_matches(&self) -> usize {
        self.layers.values().map(Vec::len).sum()
    }

    /// Whether no layer matched anything.
    pub fn is_empty(&self) -> bool {
        self.total_matches() == 0
    }
}

/// Context router over the global, domain and language layers.
pub struct ContextRouter {
    policy: RoutingPolicy,
    global: RwLock<Vec<Arc<ContextEntry>>>,
    domain: RwLock<Vec<Arc<ContextEntry>>>,
    language: RwLock<Vec<Arc<ContextEntry>>>,
}

impl ContextRouter {
    /// Create a router with the given policy.
    pub fn new(policy: RoutingPolicy) -> Self {
        Self {
            policy,
            global: RwLock::new(Vec::new()),
            domain: RwLock::new(Vec::new()),
            language: RwLock::new(Vec::new()),
        }
    }

    fn layer_store(&self, layer: ContextLayer) -> &RwLock<Vec<Arc<ContextEntry>>> {
        match layer {
            ContextLayer::Global => &self.global,
            ContextLayer::Domain => &self.domain,
            ContextLayer::Language => &self.language,
        }
    }

    /// Append an entry to the layer named by `entry.layer`.
    ///
    /// No deduplication; redundancy is measured by the balance gate.
    pub fn add_context(&self, entry: ContextEntry) {
        let layer = entry.layer;
        self.layer_store(layer).write().push(Arc::new(entry));
    }

    /// Threshold for one layer, see [`adjusted_threshold`].
    pub fn adjust_threshold(&self, layer: ContextLayer, query_complexity: f32, language_match: bool) -> f32 {
        adjusted_threshold(&self.policy, layer, query_complexity, language_match)
    }

    /// Retrieve ranked matches from every layer.
    ///
    /// ## Algorithm
    ///
    /// For each layer:
    /// 1. Compute the adjusted threshold (the language layer always counts as a language match)
    /// 2. Filter candidates: language layer by query language, domain layer by query domain if given
    /// 3. Keep candidates whose similarity is at or above the threshold
    /// 4. Sort descending (stable, ties keep insertion order) and keep `top_k`
    pub fn route_context(&self, query: &ContextQuery) -> RoutedContext {
        let top_k = query.top_k.unwrap_or(self.policy.default_top_k);
        let mut routed = RoutedContext::default();

        for layer in ContextLayer::ALL {
            let language_match = layer == ContextLayer::Language;
            let threshold = self.adjust_threshold(layer, query.complexity, language_match);

            let entries = self.layer_store(layer).read();
            let mut candidates = 0usize;
            let mut scored = Vec::new();

            for entry in entries.iter() {
                if layer == ContextLayer::Language && entry.language != query.language {
                    continue;
                }
                if layer == ContextLayer::Domain {
                    if let Some(domain) = &query.domain {
                        if entry.domain.as_ref() != Some(domain) {
                            continue;
                        }
                    }
                }

                candidates += 1;
                let score = similarity(&query.embedding, &entry.embedding);
                if score >= threshold {
                    scored.push(ScoredEntry::new(Arc::clone(entry), score));
                }
            }
            drop(entries);

            let ranked = rank_top_k(scored, top_k);
            tracing::debug!(
                layer = %layer,
                threshold = threshold,
                candidates = candidates,
                kept = ranked.len(),
                "routed context layer"
            );

            routed.layers.insert(layer, ranked);
            routed.thresholds.insert(layer, threshold);
            routed.candidates.insert(layer, candidates);
        }

        routed
    }

    /// Merge routed matches into one context blob.
    ///
    /// Layers are visited Language > Domain > Global; each entry is tagged
    /// `[layer|score]`. Token cost is approximated as chars / 4. Appending
    /// within a layer stops at the first entry that would exceed
    /// `max_tokens`; the next layer is still tried unless the budget is spent.
    pub fn merge_context(&self, routed: &RoutedContext, max_tokens: usize) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut token_count = 0usize;

        for layer in ContextLayer::merge_priority() {
            for scored in routed.get(layer) {
                let entry_tokens = scored.entry.approx_tokens();
                if token_count + entry_tokens > max_tokens {
                    break;
                }
                parts.push(format!("[{}|{:.3}] {}", layer, scored.similarity, scored.entry.content));
                token_count += entry_tokens;
            }

            if token_count >= max_tokens {
                break;
            }
        }

        parts.join("\n\n")
    }

    /// Entry count per layer.
    pub fn layer_stats(&self) -> BTreeMap<ContextLayer, usize> {
        ContextLayer::ALL
            .iter()
            .map(|&layer| (layer, self.layer_store(layer).read().len()))
            .collect()
    }

    /// Snapshot of one layer's entries in insertion order.
    pub fn layer_entries(&self, layer: ContextLayer) -> Vec<Arc<ContextEntry>> {
        self.layer_store(layer).read().clone()
    }

    /// Remove every entry of one layer. Returns the number removed.
    pub fn clear_layer(&self, layer: ContextLayer) -> usize {
        let mut store = self.layer_store(layer).write();
        let removed = store.len();
        store.clear();
        tracing::info!(layer = %layer, removed = removed, "cleared context layer");
        removed
    }

    /// Total entries across layers.
    pub fn len(&self) -> usize {
        self.layer_stats().values().sum()
    }

    /// Whether all layers are empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the policy.
    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }
}

impl Default for ContextRouter {
    fn default() -> Self {
        Self::new(RoutingPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(content: &str, layer: ContextLayer, embedding: Vec<f32>, language: &str) -> ContextEntry {
        ContextEntry::new(content, layer, embedding, language)
    }

    #[test]
    fn test_add_context_counts_per_layer() {
        let router = ContextRouter::default();
        router.add_context(entry("g1", ContextLayer::Global, vec![1.0, 0.0], "en"));
        router.add_context(entry("g2", ContextLayer::Global, vec![1.0, 0.0], "en"));
        router.add_context(entry("l1", ContextLayer::Language, vec![1.0, 0.0], "es"));

        let stats = router.layer_stats();
        assert_eq!(stats[&ContextLayer::Global], 2);
        assert_eq!(stats[&ContextLayer::Domain], 0);
        assert_eq!(stats[&ContextLayer::Language], 1);
        assert_eq!(router.len(), 3);
    }

    #[test]
    fn test_inverted_bounds_still_route() {
        let router = ContextRouter::new(RoutingPolicy::new(0.8, 0.95, 0.70));
        router.add_context(entry("kept", ContextLayer::Global, vec![1.0, 0.0], "en"));
        router.add_context(entry("dropped", ContextLayer::Global, vec![0.6, 0.8], "en"));

        let routed = router.route_context(&ContextQuery::new(vec![1.0, 0.0], "en"));
        let global = routed.get(ContextLayer::Global);
        assert_eq!(global.len(), 1);
        assert_eq!(global[0].entry.content, "kept");
    }

    #[test]
    fn test_empty_store_routes_to_empty_layers() {
        let router = ContextRouter::default();
        let routed = router.route_context(&ContextQuery::new(vec![1.0, 0.0], "en"));

        assert_eq!(routed.layers.len(), 3);
        assert!(routed.is_empty());
        assert_eq!(router.merge_context(&routed, 2048), "");
    }

    #[test]
    fn test_language_layer_filters_language() {
        let router = ContextRouter::default();
        router.add_context(entry("hola", ContextLayer::Language, vec![1.0, 0.0], "es"));
        router.add_context(entry("hello", ContextLayer::Language, vec![1.0, 0.0], "en"));

        let routed = router.route_context(&ContextQuery::new(vec![1.0, 0.0], "en"));
        let language = routed.get(ContextLayer::Language);
        assert_eq!(language.len(), 1);
        assert_eq!(language[0].entry.content, "hello");
    }

    #[test]
    fn test_domain_layer_filters_domain_when_given() {
        let router = ContextRouter::default();
        router.add_context(entry("law", ContextLayer::Domain, vec![1.0, 0.0], "en").with_domain("law"));
        router.add_context(entry("med", ContextLayer::Domain, vec![1.0, 0.0], "en").with_domain("medicine"));

        let any = router.route_context(&ContextQuery::new(vec![1.0, 0.0], "en"));
        assert_eq!(any.get(ContextLayer::Domain).len(), 2);

        let law = router.route_context(&ContextQuery::new(vec![1.0, 0.0], "en").with_domain("law"));
        assert_eq!(law.get(ContextLayer::Domain).len(), 1);
        assert_eq!(law.get(ContextLayer::Domain)[0].entry.content, "law");
        assert_eq!(law.candidates[&ContextLayer::Domain], 1);
    }

    #[test]
    fn test_threshold_filters_weak_matches() {
        let router = ContextRouter::default();
        // cos ~ 0.82 against [1, 0]: passes domain (0.80) but not global (0.85)
        router.add_context(entry("g", ContextLayer::Global, vec![0.82, 0.57], "en"));
        router.add_context(entry("d", ContextLayer::Domain, vec![0.82, 0.57], "en"));

        let routed = router.route_context(&ContextQuery::new(vec![1.0, 0.0], "en"));
        assert!(routed.get(ContextLayer::Global).is_empty());
        assert_eq!(routed.get(ContextLayer::Domain).len(), 1);
    }

    #[test]
    fn test_top_k_and_stable_ties() {
        let router = ContextRouter::default();
        for i in 0..6 {
            router.add_context(entry(&format!("e{i}"), ContextLayer::Global, vec![1.0, 0.0], "en"));
        }

        let routed = router.route_context(&ContextQuery::new(vec![1.0, 0.0], "en").with_top_k(3));
        let contents: Vec<_> = routed
            .get(ContextLayer::Global)
            .iter()
            .map(|s| s.entry.content.as_str())
            .collect();
        assert_eq!(contents, vec!["e0", "e1", "e2"]);
    }

    #[test]
    fn test_merge_priority_and_tags() {
        let router = ContextRouter::default();
        router.add_context(entry("global fact", ContextLayer::Global, vec![1.0, 0.0], "en"));
        router.add_context(entry("domain fact", ContextLayer::Domain, vec![1.0, 0.0], "en"));
        router.add_context(entry("language fact", ContextLayer::Language, vec![1.0, 0.0], "en"));

        let routed = router.route_context(&ContextQuery::new(vec![1.0, 0.0], "en"));
        let merged = router.merge_context(&routed, 2048);

        assert_eq!(
            merged,
            "[language|1.000] language fact\n\n[domain|1.000] domain fact\n\n[global|1.000] global fact"
        );
    }

    #[test]
    fn test_merge_respects_budget() {
        let router = ContextRouter::default();
        // 40 chars = 10 tokens each
        let text = "x".repeat(40);
        router.add_context(entry(&text, ContextLayer::Language, vec![1.0, 0.0], "en"));
        router.add_context(entry(&text, ContextLayer::Language, vec![1.0, 0.0], "en"));
        router.add_context(entry("short", ContextLayer::Global, vec![1.0, 0.0], "en"));

        let routed = router.route_context(&ContextQuery::new(vec![1.0, 0.0], "en"));
        let merged = router.merge_context(&routed, 15);

        // Second language entry would exceed the budget; the small global one still fits.
        assert_eq!(merged.matches("[language|").count(), 1);
        assert!(merged.contains("[global|1.000] short"));
    }

    #[test]
    fn test_clear_layer() {
        let router = ContextRouter::default();
        router.add_context(entry("g", ContextLayer::Global, vec![1.0], "en"));
        router.add_context(entry("d", ContextLayer::Domain, vec![1.0], "en"));

        assert_eq!(router.clear_layer(ContextLayer::Global), 1);
        assert_eq!(router.layer_stats()[&ContextLayer::Global], 0);
        assert_eq!(router.layer_stats()[&ContextLayer::Domain], 1);
    }
}
