//! Text quality oracles: hallucination detection and grounding.
//!
//! [`HeuristicQualityOracle`] uses phrase and substring checks. A trained
//! detector can replace it through [`TextQualityOracle`] without changing
//! the repair stream.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::HallucinationType;

/// Context a text is checked against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepairContext {
    /// Entities the text is expected to mention.
    pub entities: Vec<String>,
    /// Provenance tag recorded on corrections.
    pub source: Option<String>,
    /// Coherence of the path the text was rendered from.
    pub coherence: Option<f32>,
}

impl RepairContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expected entities.
    pub fn with_entities<I, S>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entities = entities.into_iter().map(Into::into).collect();
        self
    }

    /// Set the provenance tag.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the path coherence.
    pub fn with_coherence(mut self, coherence: f32) -> Self {
        self.coherence = Some(coherence);
        self
    }
}

/// Capability for judging generated text.
pub trait TextQualityOracle: Send + Sync {
    /// Classify a hallucination in `text`, if any.
    fn detect_hallucination(&self, text: &str, context: &RepairContext) -> Option<HallucinationType>;

    /// How grounded `text` is in `reference`, in [0, 1].
    fn grounding(&self, text: &str, reference: &str) -> f32;
}

/// Phrase-based detector.
///
/// - A claim phrase without an attribution phrase is an unsupported claim.
/// - Otherwise, with a non-empty entity list, text mentioning none of the
///   entities (case-insensitive) is an entity mismatch.
#[derive(Debug, Clone)]
pub struct HeuristicQualityOracle {
    claim_phrases: Vec<String>,
    attribution_phrases: Vec<String>,
}

impl HeuristicQualityOracle {
    /// Create a detector with custom phrase lists. Phrases are matched lowercase.
    pub fn new(claim_phrases: Vec<String>, attribution_phrases: Vec<String>) -> Self {
        Self {
            claim_phrases: claim_phrases.into_iter().map(|p| p.to_lowercase()).collect(),
            attribution_phrases: attribution_phrases.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }
}

impl Default for HeuristicQualityOracle {
    fn default() -> Self {
        Self::new(vec!["research shows".to_string()], vec!["according to".to_string()])
    }
}

impl TextQualityOracle for HeuristicQualityOracle {
    fn detect_hallucination(&self, text: &str, context: &RepairContext) -> Option<HallucinationType> {
        let lower = text.to_lowercase();

        let claims = self.claim_phrases.iter().any(|p| lower.contains(p.as_str()));
        let attributed = self.attribution_phrases.iter().any(|p| lower.contains(p.as_str()));
        if claims && !attributed {
            return Some(HallucinationType::UnsupportedClaim);
        }

        if context.entities.is_empty() {
            return None;
        }
        let mentioned = context
            .entities
            .iter()
            .any(|entity| lower.contains(&entity.to_lowercase()));
        if mentioned {
            None
        } else {
            Some(HallucinationType::EntityMismatch)
        }
    }

    fn grounding(&self, text: &str, reference: &str) -> f32 {
        let words = word_set(text);
        if words.is_empty() {
            return 0.0;
        }
        let reference = word_set(reference);
        let shared = words.iter().filter(|w| reference.contains(*w)).count();
        shared as f32 / words.len() as f32
    }
}

/// Distinct lowercase words with surrounding punctuation stripped.
fn word_set(text: &str) -> BTreeSet<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}
