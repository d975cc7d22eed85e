//! Edit and memory types for the repair stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonically increasing edit identifier, unique within a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EditId(u64);

impl EditId {
    /// Create an edit id from its sequence number.
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Sequence number.
    pub fn seq(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EditId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edit_{:06}", self.0)
    }
}

/// Kind of text edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditType {
    /// Splice text in at a position.
    Insertion,
    /// Remove the first occurrence of a span.
    Deletion,
    /// Replace the first occurrence of a span.
    Substitution,
    /// Reorder spans. Has no text effect yet.
    Reordering,
}

impl fmt::Display for EditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insertion => write!(f, "insertion"),
            Self::Deletion => write!(f, "deletion"),
            Self::Substitution => write!(f, "substitution"),
            Self::Reordering => write!(f, "reordering"),
        }
    }
}

/// Class of hallucination a correction addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HallucinationType {
    /// Statement contradicts known facts.
    FactualError,
    /// Text does not mention any entity from its context.
    EntityMismatch,
    /// Dates or orderings do not line up.
    TemporalInconsistency,
    /// Text contradicts itself.
    LogicalContradiction,
    /// Confident claim without attribution.
    UnsupportedClaim,
}

impl HallucinationType {
    /// All hallucination types.
    pub const ALL: [HallucinationType; 5] = [
        Self::FactualError,
        Self::EntityMismatch,
        Self::TemporalInconsistency,
        Self::LogicalContradiction,
        Self::UnsupportedClaim,
    ];

    /// Snake-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FactualError => "factual_error",
            Self::EntityMismatch => "entity_mismatch",
            Self::TemporalInconsistency => "temporal_inconsistency",
            Self::LogicalContradiction => "logical_contradiction",
            Self::UnsupportedClaim => "unsupported_claim",
        }
    }
}

impl fmt::Display for HallucinationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single correction applied (or applicable) to text.
///
/// Immutable once created; memory entries keep copies in their history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    /// Unique id within the stream.
    pub id: EditId,
    /// Edit kind.
    pub edit_type: EditType,
    /// Character offset, used by insertions.
    pub position: usize,
    /// Span being replaced or removed.
    pub original_text: String,
    /// Replacement or inserted text.
    pub corrected_text: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
    /// Hallucination this edit corrects, if any.
    pub hallucination_type: Option<HallucinationType>,
    /// Source tag justifying the correction.
    pub provenance: Option<String>,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

/// Memory tier of the repair stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryTier {
    /// Recent entries, bounded by the short-term capacity.
    ShortTerm,
    /// Promoted trustworthy entries, bounded by the long-term capacity.
    LongTerm,
}

impl fmt::Display for MemoryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortTerm => write!(f, "short_term"),
            Self::LongTerm => write!(f, "long_term"),
        }
    }
}

/// One repaired text and the edits that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Repaired text.
    pub content: String,
    /// Tier currently holding the entry.
    pub tier: MemoryTier,
    /// Edits applied, in order.
    pub edit_history: Vec<Edit>,
    /// Reliability in [0, 1].
    pub reliability_score: f32,
    /// Last time the entry was written or moved.
    pub last_accessed: DateTime<Utc>,
}

impl MemoryEntry {
    /// Create a short-term entry.
    pub fn short_term(content: impl Into<String>, edit_history: Vec<Edit>, reliability_score: f32) -> Self {
        Self {
            content: content.into(),
            tier: MemoryTier::ShortTerm,
            edit_history,
            reliability_score: reliability_score.clamp(0.0, 1.0),
            last_accessed: Utc::now(),
        }
    }

    /// Find an edit in this entry's history.
    pub fn find_edit(&self, id: EditId) -> Option<&Edit> {
        self.edit_history.iter().find(|e| e.id == id)
    }
}
