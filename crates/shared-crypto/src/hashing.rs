//! # Double SHA-256 Hashing
//!
//! The canonical content hash of the platform. Every derived identifier
//! (data contract id, document id) and every entity hash is `sha256d` over
//! canonical bytes, so the output must be reproduced bit for bit on every node.

use sha2::{Digest, Sha256};

/// 256-bit hash output.
pub type Hash = [u8; 32];

/// Streaming double SHA-256 hasher.
///
/// Inputs are fed in order; `finalize` applies the second SHA-256 round over
/// the first digest.
#[derive(Clone, Default)]
pub struct Sha256dHasher {
    inner: Sha256,
}

impl Sha256dHasher {
    /// Create new hasher.
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Finalize and return hash.
    pub fn finalize(self) -> Hash {
        let first = self.inner.finalize();
        Sha256::digest(first).into()
    }
}

/// Single SHA-256.
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Double SHA-256 (one-shot).
pub fn sha256d(data: &[u8]) -> Hash {
    sha256(&sha256(data))
}

/// Double SHA-256 over the concatenation of `inputs`, in the given order.
pub fn sha256d_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha256dHasher::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256("abc")
        let expected = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
        assert_eq!(hex::encode(sha256(b"abc")), expected);
    }

    #[test]
    fn test_sha256d_is_hash_of_hash() {
        let once = sha256(b"platform");
        assert_eq!(sha256d(b"platform"), sha256(&once));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(sha256d(b"test"), sha256d(b"test"));
        assert_ne!(sha256d(b"input1"), sha256d(b"input2"));
    }

    #[test]
    fn test_many_equals_concatenation() {
        let joined = sha256d(b"hello world");
        let parts = sha256d_many(&[b"hello ", b"world"]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn test_order_matters() {
        let ab = sha256d_many(&[b"a", b"b"]);
        let ba = sha256d_many(&[b"b", b"a"]);
        assert_ne!(ab, ba);
    }
}
