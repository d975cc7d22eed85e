//! Canonical content hashing for context and memory entries.
//!
//! ```text
//! canonical_content(text) = UTF-8(collapse_whitespace(normalize_newlines(text)))
//! ```
//!
//! - `normalize_newlines`: CRLF -> LF, CR -> LF
//! - `collapse_whitespace`: runs of spaces/tabs inside a line become one space,
//!   lines are trimmed, leading and trailing blank lines are dropped
//!
//! Two entries whose text differs only in these respects share a hash, which
//! is what the balance gate counts as an exact duplicate.

use sha2::{Digest, Sha256};

/// Version of the canonicalization rules.
///
/// Changing the rules invalidates stored hashes.
pub const CANONICAL_CONTENT_VERSION: &str = "1.0.0";

/// Normalize text to canonical form.
///
/// ```rust
/// use evaluation_oracle::canonical_content::normalize_text;
///
/// assert_eq!(normalize_text("  Hola\t  mundo \r\n adiós "), "Hola mundo\nadiós");
/// ```
pub fn normalize_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");

    let lines: Vec<String> = unified
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();

    lines.join("\n").trim_matches('\n').to_string()
}

/// Canonical UTF-8 bytes of `text`.
pub fn canonical_content(text: &str) -> Vec<u8> {
    normalize_text(text).into_bytes()
}

/// SHA-256 of the canonical content, as 64 lowercase hex chars.
pub fn compute_content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_content(text));
    hex::encode(hasher.finalize())
}

/// Whether two texts are identical after canonicalization.
pub fn same_content(a: &str, b: &str) -> bool {
    normalize_text(a) == normalize_text(b)
}
