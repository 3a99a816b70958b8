//! Content hashing for tie formats.
//!
//! A fingerprint covers the composition of a tie format (collections,
//! groups, win criteria) but not its id, so identical compositions hash
//! identically regardless of where they are attached.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 content hash.
pub type ContentHash = [u8; 32];

/// Compute the SHA-256 content hash of a value's canonical JSON.
///
/// Fails when the value has no JSON form, such as a map with non-string keys.
pub fn content_hash<T: Serialize>(value: &T) -> serde_json::Result<ContentHash> {
    let json = serde_json::to_vec(value)?;
    Ok(bytes_hash(&json))
}

/// Compute the SHA-256 hash of raw bytes.
pub fn bytes_hash(bytes: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Format a content hash as a hex string.
pub fn hash_hex(hash: &ContentHash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}
