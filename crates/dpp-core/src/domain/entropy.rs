//! # Entropy
//!
//! Creation-time randomness bound into data contract and document ids.
//! Text form: 17 random bytes as 34 lowercase hex characters.

use super::limits::ENTROPY_LENGTH;
use rand::RngCore;

/// Number of random bytes behind the text form.
pub const ENTROPY_BYTES: usize = ENTROPY_LENGTH / 2;

/// Generates fresh entropy that passes [`is_valid`].
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    let mut bytes = [0u8; ENTROPY_BYTES];
    loop {
        rng.fill_bytes(&mut bytes);
        if !all_identical(&bytes) {
            return hex::encode(bytes);
        }
    }
}

/// Decodes the text form. `None` unless it is exactly 34 lowercase hex
/// characters.
pub fn decode(entropy: &str) -> Option<[u8; ENTROPY_BYTES]> {
    if entropy.len() != ENTROPY_LENGTH
        || !entropy
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return None;
    }
    let mut bytes = [0u8; ENTROPY_BYTES];
    hex::decode_to_slice(entropy, &mut bytes).ok()?;
    Some(bytes)
}

/// Randomness check: decodable and not a single repeated byte.
pub fn is_valid(entropy: &str) -> bool {
    decode(entropy).is_some_and(|bytes| !all_identical(&bytes))
}

fn all_identical(bytes: &[u8]) -> bool {
    bytes.windows(2).all(|pair| pair[0] == pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_entropy_is_valid() {
        for _ in 0..32 {
            let entropy = generate();
            assert_eq!(entropy.len(), ENTROPY_LENGTH);
            assert!(is_valid(&entropy));
        }
    }

    #[test]
    fn test_zero_entropy_rejected_but_decodable() {
        let zeros = "0".repeat(ENTROPY_LENGTH);

        assert!(decode(&zeros).is_some());
        assert!(!is_valid(&zeros));
    }

    #[test]
    fn test_wrong_shape_rejected() {
        assert!(decode("abcd").is_none());
        assert!(decode(&"A1".repeat(17)).is_none());
        assert!(decode(&"zz".repeat(17)).is_none());
        assert!(!is_valid(&"0a".repeat(18)));
    }
}
