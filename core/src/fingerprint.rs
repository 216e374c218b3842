//! Script change detection.
//!
//! A script's content is never exposed after it is written; its observable
//! state is a fixed-length digest instead. Equal fingerprints are taken to
//! mean equal content.

use std::fmt;

use sha2::{Digest, Sha256};

/// Opaque fixed-length digest of a script body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already computed digest, e.g. one loaded from persisted state.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Fingerprint(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes fingerprints. Must be deterministic and depend only on `content`.
pub trait Fingerprinter {
    fn fingerprint(&self, content: &str) -> Fingerprint;
}

/// SHA-256, hex encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Fingerprinter;

impl Fingerprinter for Sha256Fingerprinter {
    fn fingerprint(&self, content: &str) -> Fingerprint {
        Fingerprint(hex::encode(Sha256::digest(content.as_bytes())))
    }
}
