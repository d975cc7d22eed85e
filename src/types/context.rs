//! Context layer types for the router.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::canonical_content::compute_content_hash;

/// Scope partition of retrievable background context.
///
/// Declaration order (Global, Domain, Language) is the canonical iteration
/// order; merge priority is the reverse, see [`ContextLayer::merge_priority`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextLayer {
    /// Background knowledge shared by every query.
    Global,
    /// Knowledge scoped to a domain (medicine, law, ...).
    Domain,
    /// Knowledge scoped to the query language.
    Language,
}

impl ContextLayer {
    /// All layers in canonical order.
    pub const ALL: [ContextLayer; 3] = [Self::Global, Self::Domain, Self::Language];

    /// Layers in merge priority order: Language > Domain > Global.
    pub fn merge_priority() -> [ContextLayer; 3] {
        [Self::Language, Self::Domain, Self::Global]
    }

    /// Parse layer from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "global" => Some(Self::Global),
            "domain" => Some(Self::Domain),
            "language" => Some(Self::Language),
            _ => None,
        }
    }

    /// Lowercase name, used as the tag in merged context.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Domain => "domain",
            Self::Language => "language",
        }
    }
}

impl fmt::Display for ContextLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-dimension semantic embedding.
///
/// Immutable once produced. Clones share the underlying buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Arc<[f32]>);

impl Embedding {
    /// Wrap a vector of components.
    pub fn new(values: Vec<f32>) -> Self {
        Self(values.into())
    }

    /// Components as a slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Number of dimensions.
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f32 {
        self.0.iter().map(|v| v * v).sum::<f32>().sqrt()
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

impl From<&[f32]> for Embedding {
    fn from(values: &[f32]) -> Self {
        Self(values.into())
    }
}

/// A unit of retrievable context.
///
/// Owned by the router's per-layer store and never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Context text.
    pub content: String,
    /// Layer this entry lives in.
    pub layer: ContextLayer,
    /// Semantic embedding of `content`.
    pub embedding: Embedding,
    /// Language code (e.g. "en", "es").
    pub language: String,
    /// Domain code, if the entry is domain scoped.
    pub domain: Option<String>,
    /// Free-form metadata.
    pub metadata: Option<BTreeMap<String, String>>,
    /// SHA-256 of the canonical content.
    pub content_hash: String,
}

impl ContextEntry {
    /// Create a new entry.
    pub fn new(
        content: impl Into<String>,
        layer: ContextLayer,
        embedding: impl Into<Embedding>,
        language: impl Into<String>,
    ) -> Self {
        let content = content.into();
        let content_hash = compute_content_hash(&content);
        Self {
            content,
            layer,
            embedding: embedding.into(),
            language: language.into(),
            domain: None,
            metadata: None,
            content_hash,
        }
    }

    /// Set the domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Add a metadata key.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Approximate token cost: four characters per token.
    pub fn approx_tokens(&self) -> usize {
        self.content.chars().count() / 4
    }
}
