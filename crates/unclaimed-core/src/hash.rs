//! Pure synchronous hashing
//!
//! Hashing is deterministic and side-effect free, so it is a plain function
//! rather than an injected effect. All digests in the registry go through
//! this module; changing the algorithm here changes it everywhere.
//!
//! Current algorithm: **SHA-256** (32-byte output)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hash arbitrary bytes to a 32-byte digest
pub fn hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Type-safe 256-bit digest
///
/// Wraps a raw `[u8; 32]` so message digests cannot be mixed up with
/// addresses or other fixed-width byte arrays.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Hash32(pub [u8; 32]);

impl Hash32 {
    /// Create a digest from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash `data` into a digest
    pub fn digest(data: &[u8]) -> Self {
        Self(hash(data))
    }

    /// Get the raw bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({})", self.to_hex())
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; 32]> for Hash32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let a = hash(b"hello world");
        let b = hash(b"hello world");
        assert_eq!(a, b);
        assert_ne!(a, hash(b"hello world!"));
    }

    #[test]
    fn test_digest_wraps_hash() {
        assert_eq!(Hash32::digest(b"hello world").as_bytes(), &hash(b"hello world"));
    }

    #[test]
    fn test_known_vector() {
        // SHA-256("abc")
        assert_eq!(
            Hash32::digest(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
