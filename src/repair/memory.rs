//! Dual-tier edit memory.
//!
//! Two bounded FIFO tiers. On short-term overflow, the oldest entry with
//! reliability above the promotion bar moves to long-term; if none
//! qualifies, the oldest short-term entry is dropped. Long-term overflow
//! drops its oldest entry.
//!
//! Selecting the promotion candidate is a linear scan of the short-term
//! tier, O(n) per insertion.

use chrono::Utc;
use std::collections::VecDeque;

use crate::policy::MemoryPolicy;
use crate::types::{Edit, EditId, MemoryEntry, MemoryTier};

/// What capacity management did after an insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rebalance {
    /// Short-term tier was within capacity.
    Within,
    /// An entry was promoted to long-term.
    Promoted {
        /// Whether the oldest long-term entry was dropped to make room.
        evicted_long_term: bool,
    },
    /// No entry qualified; the oldest short-term entry was dropped.
    DroppedShortTerm,
}

/// Short-term and long-term memory tiers.
#[derive(Debug, Clone)]
pub struct DualMemory {
    short_term: VecDeque<MemoryEntry>,
    long_term: VecDeque<MemoryEntry>,
    short_term_capacity: usize,
    long_term_capacity: usize,
    promotion_threshold: f32,
}

impl DualMemory {
    /// Create empty tiers sized by the policy.
    pub fn new(policy: &MemoryPolicy) -> Self {
        Self {
            short_term: VecDeque::with_capacity(policy.short_term_capacity + 1),
            long_term: VecDeque::new(),
            short_term_capacity: policy.short_term_capacity,
            long_term_capacity: policy.long_term_capacity,
            promotion_threshold: policy.promotion_threshold,
        }
    }

    /// Insert an entry into the short-term tier and enforce capacities.
    pub fn insert(&mut self, mut entry: MemoryEntry) -> Rebalance {
        entry.tier = MemoryTier::ShortTerm;
        self.short_term.push_back(entry);

        let action = if self.short_term.len() <= self.short_term_capacity {
            Rebalance::Within
        } else {
            self.rebalance()
        };

        debug_assert!(self.short_term.len() <= self.short_term_capacity);
        debug_assert!(self.long_term.len() <= self.long_term_capacity);
        action
    }

    fn rebalance(&mut self) -> Rebalance {
        let candidate = self
            .short_term
            .iter()
            .position(|e| e.reliability_score > self.promotion_threshold);

        let Some(idx) = candidate else {
            if let Some(dropped) = self.short_term.pop_front() {
                tracing::debug!(
                    reliability = dropped.reliability_score,
                    edits = dropped.edit_history.len(),
                    "dropped short-term entry below promotion bar"
                );
            }
            return Rebalance::DroppedShortTerm;
        };

        let Some(mut promoted) = self.short_term.remove(idx) else {
            return Rebalance::Within;
        };
        promoted.tier = MemoryTier::LongTerm;
        promoted.last_accessed = Utc::now();
        tracing::info!(
            reliability = promoted.reliability_score,
            edits = promoted.edit_history.len(),
            "promoted entry to long-term memory"
        );
        self.long_term.push_back(promoted);

        let evicted_long_term = self.long_term.len() > self.long_term_capacity;
        if evicted_long_term {
            self.long_term.pop_front();
            tracing::debug!(capacity = self.long_term_capacity, "evicted oldest long-term entry");
        }
        Rebalance::Promoted { evicted_long_term }
    }

    /// Short-term entries, oldest first.
    pub fn short_term(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.short_term.iter()
    }

    /// Long-term entries, oldest first.
    pub fn long_term(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.long_term.iter()
    }

    /// Short-term then long-term entries.
    pub fn iter(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.short_term.iter().chain(self.long_term.iter())
    }

    /// Number of short-term entries.
    pub fn short_term_len(&self) -> usize {
        self.short_term.len()
    }

    /// Number of long-term entries.
    pub fn long_term_len(&self) -> usize {
        self.long_term.len()
    }

    /// Find an edit and the tier holding it. Linear in total history size.
    pub fn find_edit(&self, id: EditId) -> Option<(&Edit, MemoryTier)> {
        self.iter()
            .find_map(|entry| entry.find_edit(id).map(|edit| (edit, entry.tier)))
    }

    /// Mean reliability across both tiers, 0.0 when empty.
    pub fn mean_reliability(&self) -> f32 {
        let count = self.short_term.len() + self.long_term.len();
        if count == 0 {
            return 0.0;
        }
        let total: f64 = self.iter().map(|e| e.reliability_score as f64).sum();
        (total / count as f64) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_entry(content: &str, reliability: f32) -> MemoryEntry {
        MemoryEntry::short_term(content, vec![], reliability)
    }

    fn make_memory(short: usize, long: usize) -> DualMemory {
        DualMemory::new(&MemoryPolicy::with_capacities(short, long))
    }

    #[test]
    fn test_within_capacity() {
        let mut memory = make_memory(2, 2);
        assert_eq!(memory.insert(make_entry("a", 1.0)), Rebalance::Within);
        assert_eq!(memory.insert(make_entry("b", 1.0)), Rebalance::Within);
        assert_eq!(memory.short_term_len(), 2);
        assert_eq!(memory.long_term_len(), 0);
    }

    #[test]
    fn test_promotes_oldest_reliable() {
        let mut memory = make_memory(2, 5);
        memory.insert(make_entry("unreliable", 0.5));
        memory.insert(make_entry("reliable", 0.9));
        let action = memory.insert(make_entry("newest", 0.95));

        assert_eq!(action, Rebalance::Promoted { evicted_long_term: false });
        let long: Vec<_> = memory.long_term().map(|e| e.content.as_str()).collect();
        assert_eq!(long, vec!["reliable"]);
        assert_eq!(memory.long_term().next().unwrap().tier, MemoryTier::LongTerm);

        let short: Vec<_> = memory.short_term().map(|e| e.content.as_str()).collect();
        assert_eq!(short, vec!["unreliable", "newest"]);
    }

    #[test]
    fn test_promotion_bar_is_strict() {
        let mut memory = make_memory(1, 5);
        memory.insert(make_entry("at bar", 0.8));
        let action = memory.insert(make_entry("below", 0.7));

        assert_eq!(action, Rebalance::DroppedShortTerm);
        assert_eq!(memory.long_term_len(), 0);
        assert_eq!(memory.short_term().next().unwrap().content, "below");
    }

    #[test]
    fn test_long_term_eviction() {
        let mut memory = make_memory(1, 2);
        for i in 0..5 {
            memory.insert(make_entry(&format!("e{i}"), 1.0));
        }
        assert_eq!(memory.short_term_len(), 1);
        let long: Vec<_> = memory.long_term().map(|e| e.content.as_str()).collect();
        assert_eq!(long, vec!["e2", "e3"]);
    }

    #[test]
    fn test_mean_reliability() {
        let mut memory = make_memory(10, 10);
        assert_eq!(memory.mean_reliability(), 0.0);
        memory.insert(make_entry("a", 1.0));
        memory.insert(make_entry("b", 0.9));
        assert!((memory.mean_reliability() - 0.95).abs() < 1e-6);
    }
}
