//! Sentence fingerprints.
//!
//! A fingerprint is the SHA-256 digest of the source sentence text and is
//! the cache key for its grammar. It deliberately does *not* include any
//! context or adaptation version: grammars derive from the static model and
//! the sentence, so every context can reuse an entry. Staleness after
//! adaptation is handled by explicit invalidation, not by the key.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 digest of a source sentence.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint a source sentence.
    #[must_use]
    pub fn of(sentence: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(sentence.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short prefix is enough for log lines
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}
