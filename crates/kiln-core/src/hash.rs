//! Content hashing for generated artifacts

use sha2::{Digest, Sha256};
use std::fmt;

/// A SHA-256 digest of an artifact's bytes.
///
/// Generated models and textures are stored under a name derived from their
/// content, so regenerating an identical asset reuses the same file.
#[derive(Clone, Copy, Hash, Eq, PartialEq)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Compute a hash from bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Full lowercase hex digest
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// First 16 hex characters, enough to keep generated file names unique
    pub fn short(&self) -> String {
        self.to_hex()[..16].to_string()
    }

    /// File name for an artifact with the given extension (without the dot)
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.short(), extension)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}
