//! Readers for integer wire fields.
//!
//! The schema validator accepts integral floats (`5.0`) wherever it accepts
//! integers, and the canonical codec may hand either back. Every numeric
//! field the protocol parses goes through these readers so parsing never
//! rejects a value the schemas accepted.

use serde_json::Value;

// 2^64; every f64 below it fits in a u64.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// Non-negative integer value of `value`, including integral floats.
pub fn as_u64(value: &Value) -> Option<u64> {
    if let Some(integer) = value.as_u64() {
        return Some(integer);
    }
    match value.as_f64() {
        Some(float) if float >= 0.0 && float.fract() == 0.0 && float < U64_LIMIT => {
            Some(float as u64)
        }
        _ => None,
    }
}

/// As [`as_u64`], limited to the `u32` range.
pub fn as_u32(value: &Value) -> Option<u32> {
    as_u64(value).and_then(|integer| u32::try_from(integer).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integral_floats_are_integers() {
        assert_eq!(as_u64(&json!(5)), Some(5));
        assert_eq!(as_u64(&json!(5.0)), Some(5));
        assert_eq!(as_u64(&json!(-0.0)), Some(0));
        assert_eq!(as_u64(&json!(5.5)), None);
        assert_eq!(as_u64(&json!(-1)), None);
        assert_eq!(as_u64(&json!(U64_LIMIT)), None);
        assert_eq!(as_u64(&json!("5")), None);
    }

    #[test]
    fn test_u32_range() {
        assert_eq!(as_u32(&json!(4_294_967_295u64)), Some(u32::MAX));
        assert_eq!(as_u32(&json!(4_294_967_295.0)), Some(u32::MAX));
        assert_eq!(as_u32(&json!(4_294_967_296u64)), None);
    }
}
