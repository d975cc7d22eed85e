//! Fingerprints of configs and report sets.
//!
//! A [`Fingerprint`] is the xxh64 hash of a value's JSON serialization,
//! streamed straight into the hasher. Two values with the same fingerprint
//! produced the same bytes, so a report's `config_hash` identifies the exact
//! quantized parameters that scored it.
//!
//! Hashed values must serialize deterministically:
//! - struct fields in declaration order
//! - `BTreeMap`, never `HashMap`
//! - floats quantized to integers by the caller

use serde::{Serialize, Serializer};
use std::fmt;
use std::io;
use xxhash_rust::xxh64::Xxh64;

/// 64-bit content fingerprint, rendered as 16 hex chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Fingerprint a serializable value.
    ///
    /// Values that fail to serialize (a map with non-string keys, or a
    /// custom `Serialize` error) fingerprint the bytes written before the
    /// failure, tagged so they never collide with a complete serialization.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Self {
        let mut sink = HashSink(Xxh64::new(0));
        if serde_json::to_writer(&mut sink, value).is_err() {
            tracing::warn!("fingerprinted value did not serialize completely");
            sink.0.update(INCOMPLETE_TAG);
        }
        Self(sink.0.digest())
    }

    /// Raw hash value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Appended to the hasher when serialization stops early. Not valid JSON.
const INCOMPLETE_TAG: &[u8] = b"\x00incomplete";

/// Writer that feeds every byte into the hasher and never fails.
struct HashSink(Xxh64);

impl io::Write for HashSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Fingerprint of `value` as a hex string.
pub fn canonical_hash_hex<T: Serialize + ?Sized>(value: &T) -> String {
    Fingerprint::of(value).to_string()
}
