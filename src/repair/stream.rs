//! Edit repair stream.
//!
//! ## Algorithm
//!
//! `apply_edits(text, context)`:
//! 1. Ask the quality oracle for a hallucination in `text`.
//! 2. If one is found, create a substitution edit replacing the whole text
//!    with `"{marker} {text}"`, tagged with the hallucination type and the
//!    context's source (or `"unknown"`), and apply it.
//! 3. Store the result as a short-term memory entry with reliability
//!    `1 - penalty * edits`, then enforce tier capacities.
//!
//! Detection, edit creation and capacity management run under one lock, so
//! concurrent callers sharing a stream are serialized.

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::memory::DualMemory;
use super::quality::{HeuristicQualityOracle, RepairContext, TextQualityOracle};
use crate::policy::MemoryPolicy;
use crate::types::{Edit, EditId, EditType, HallucinationType, MemoryEntry, MemoryTier};

/// Provenance recorded when the context names no source.
pub const UNKNOWN_PROVENANCE: &str = "unknown";

/// Parameters of an edit before it receives an id.
#[derive(Debug, Clone, PartialEq)]
pub struct EditDraft {
    /// Edit kind.
    pub edit_type: EditType,
    /// Character offset for insertions.
    pub position: usize,
    /// Span to replace or remove.
    pub original_text: String,
    /// Replacement or inserted text.
    pub corrected_text: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
    /// Hallucination corrected.
    pub hallucination_type: Option<HallucinationType>,
    /// Source tag.
    pub provenance: Option<String>,
}

impl EditDraft {
    /// Create a draft with full confidence and no tags.
    pub fn new(
        edit_type: EditType,
        position: usize,
        original_text: impl Into<String>,
        corrected_text: impl Into<String>,
    ) -> Self {
        Self {
            edit_type,
            position,
            original_text: original_text.into(),
            corrected_text: corrected_text.into(),
            confidence: 1.0,
            hallucination_type: None,
            provenance: None,
        }
    }

    /// Replace the first occurrence of `original` with `corrected`.
    pub fn substitution(original: impl Into<String>, corrected: impl Into<String>) -> Self {
        Self::new(EditType::Substitution, 0, original, corrected)
    }

    /// Insert `text` at a character offset.
    pub fn insertion(position: usize, text: impl Into<String>) -> Self {
        Self::new(EditType::Insertion, position, String::new(), text)
    }

    /// Remove the first occurrence of `original`.
    pub fn deletion(original: impl Into<String>) -> Self {
        Self::new(EditType::Deletion, 0, original, String::new())
    }

    /// Set the confidence, clamped into [0, 1].
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Tag with a hallucination type.
    pub fn with_hallucination(mut self, hallucination_type: HallucinationType) -> Self {
        self.hallucination_type = Some(hallucination_type);
        self
    }

    /// Tag with a provenance source.
    pub fn with_provenance(mut self, provenance: impl Into<String>) -> Self {
        self.provenance = Some(provenance.into());
        self
    }
}

/// Result of applying one edit to a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditOutcome {
    /// The text changed (or an insertion was spliced in).
    Applied,
    /// The span to replace or remove does not occur in the text.
    NoMatch,
    /// The edit type has no text effect (reordering).
    Unsupported,
}

/// New text plus what happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedEdit {
    /// Text after the edit. Equal to the input unless `outcome` is `Applied`.
    pub text: String,
    /// Outcome.
    pub outcome: EditOutcome,
}

/// Result of `apply_edits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairOutcome {
    /// Input text.
    pub original_text: String,
    /// Text after corrections.
    pub edited_text: String,
    /// Edits applied, in order.
    pub edits: Vec<Edit>,
    /// Reliability of the stored memory entry.
    pub reliability_score: f32,
    /// Hallucination detected, if any.
    pub hallucination: Option<HallucinationType>,
}

impl RepairOutcome {
    /// Ids of the applied edits.
    pub fn edit_ids(&self) -> Vec<EditId> {
        self.edits.iter().map(|e| e.id).collect()
    }
}

/// An edit and the tier currently holding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditProvenance {
    /// Full edit metadata.
    pub edit: Edit,
    /// Holding tier.
    pub tier: MemoryTier,
}

/// Stream counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamStatistics {
    /// Edits created over the stream's lifetime.
    pub total_edits: u64,
    /// Entries in the short-term tier.
    pub short_term_entries: usize,
    /// Entries in the long-term tier.
    pub long_term_entries: usize,
    /// Edits created per hallucination type (all types present).
    pub hallucination_counts: BTreeMap<HallucinationType, u64>,
    /// Mean reliability over both tiers, 0.0 when empty.
    pub mean_reliability: f32,
}

struct StreamState {
    memory: DualMemory,
    edit_counter: u64,
    hallucination_counts: BTreeMap<HallucinationType, u64>,
}

impl StreamState {
    fn create_edit(&mut self, draft: EditDraft) -> Edit {
        self.edit_counter += 1;
        if let Some(kind) = draft.hallucination_type {
            *self.hallucination_counts.entry(kind).or_insert(0) += 1;
        }
        Edit {
            id: EditId::new(self.edit_counter),
            edit_type: draft.edit_type,
            position: draft.position,
            original_text: draft.original_text,
            corrected_text: draft.corrected_text,
            confidence: draft.confidence.clamp(0.0, 1.0),
            hallucination_type: draft.hallucination_type,
            provenance: draft.provenance,
            timestamp: Utc::now(),
        }
    }
}

/// Detects and corrects suspect text and keeps a bounded edit history.
pub struct EditRepairStream {
    oracle: Arc<dyn TextQualityOracle>,
    policy: MemoryPolicy,
    state: Mutex<StreamState>,
}

impl EditRepairStream {
    /// Create a stream with the heuristic quality oracle.
    pub fn new(policy: MemoryPolicy) -> Self {
        Self::with_oracle(policy, Arc::new(HeuristicQualityOracle::default()))
    }

    /// Create a stream with a custom quality oracle.
    pub fn with_oracle(policy: MemoryPolicy, oracle: Arc<dyn TextQualityOracle>) -> Self {
        let hallucination_counts = HallucinationType::ALL.iter().map(|&k| (k, 0)).collect();
        let state = StreamState {
            memory: DualMemory::new(&policy),
            edit_counter: 0,
            hallucination_counts,
        };
        Self {
            oracle,
            policy,
            state: Mutex::new(state),
        }
    }

    /// The memory policy.
    pub fn policy(&self) -> &MemoryPolicy {
        &self.policy
    }

    /// The quality oracle.
    pub fn oracle(&self) -> &Arc<dyn TextQualityOracle> {
        &self.oracle
    }

    /// Classify a hallucination in `text`, if any.
    pub fn detect_hallucination(&self, text: &str, context: &RepairContext) -> Option<HallucinationType> {
        self.oracle.detect_hallucination(text, context)
    }

    /// Assign the next id to a draft and count its hallucination type.
    pub fn create_edit(&self, draft: EditDraft) -> Edit {
        self.state.lock().create_edit(draft)
    }

    /// Apply one edit to `text`.
    pub fn apply_edit(&self, text: &str, edit: &Edit) -> AppliedEdit {
        apply_edit(text, edit)
    }

    /// Detect, correct and record `text`.
    pub fn apply_edits(&self, text: &str, context: &RepairContext) -> RepairOutcome {
        let mut state = self.state.lock();

        let hallucination = self.oracle.detect_hallucination(text, context);
        let mut edited = text.to_string();
        let mut edits = Vec::new();

        if let Some(kind) = hallucination {
            let provenance = context.source.as_deref().unwrap_or(UNKNOWN_PROVENANCE);
            let draft = EditDraft::substitution(text, format!("{} {}", self.policy.correction_marker, text))
                .with_confidence(self.policy.correction_confidence)
                .with_hallucination(kind)
                .with_provenance(provenance);
            let edit = state.create_edit(draft);

            edited = apply_edit(&edited, &edit).text;
            tracing::info!(
                edit_id = %edit.id,
                hallucination = %kind,
                provenance = provenance,
                "flagged hallucination"
            );
            edits.push(edit);
        }

        let penalty = self.policy.reliability_penalty_per_edit * edits.len() as f32;
        let reliability_score = (1.0 - penalty).clamp(0.0, 1.0);

        state
            .memory
            .insert(MemoryEntry::short_term(edited.clone(), edits.clone(), reliability_score));

        RepairOutcome {
            original_text: text.to_string(),
            edited_text: edited,
            edits,
            reliability_score,
            hallucination,
        }
    }

    /// Look up an edit across both tiers.
    pub fn get_edit_provenance(&self, edit_id: EditId) -> Option<EditProvenance> {
        let state = self.state.lock();
        state.memory.find_edit(edit_id).map(|(edit, tier)| EditProvenance {
            edit: edit.clone(),
            tier,
        })
    }

    /// Snapshot of the stream counters.
    pub fn get_statistics(&self) -> StreamStatistics {
        let state = self.state.lock();
        StreamStatistics {
            total_edits: state.edit_counter,
            short_term_entries: state.memory.short_term_len(),
            long_term_entries: state.memory.long_term_len(),
            hallucination_counts: state.hallucination_counts.clone(),
            mean_reliability: state.memory.mean_reliability(),
        }
    }
}

impl Default for EditRepairStream {
    fn default() -> Self {
        Self::new(MemoryPolicy::default())
    }
}

/// Apply one edit to `text`.
///
/// Substitution and deletion act on the first occurrence of
/// `original_text`; insertion splices at a character offset clamped to the
/// text length. Reordering leaves the text unchanged.
pub fn apply_edit(text: &str, edit: &Edit) -> AppliedEdit {
    let unchanged = |outcome| AppliedEdit {
        text: text.to_string(),
        outcome,
    };

    match edit.edit_type {
        EditType::Substitution | EditType::Deletion => {
            if !text.contains(edit.original_text.as_str()) {
                return unchanged(EditOutcome::NoMatch);
            }
            let replacement = match edit.edit_type {
                EditType::Substitution => edit.corrected_text.as_str(),
                _ => "",
            };
            AppliedEdit {
                text: text.replacen(edit.original_text.as_str(), replacement, 1),
                outcome: EditOutcome::Applied,
            }
        }
        EditType::Insertion => {
            let at = text
                .char_indices()
                .nth(edit.position)
                .map(|(i, _)| i)
                .unwrap_or(text.len());
            let mut out = String::with_capacity(text.len() + edit.corrected_text.len());
            out.push_str(&text[..at]);
            out.push_str(&edit.corrected_text);
            out.push_str(&text[at..]);
            AppliedEdit {
                text: out,
                outcome: EditOutcome::Applied,
            }
        }
        EditType::Reordering => unchanged(EditOutcome::Unsupported),
    }
}
