//! # Canonical Codec
//!
//! Deterministic byte encoding of JSON-compatible object graphs.
//!
//! ## Format
//!
//! CBOR (RFC 8949) with canonical map key ordering: keys sorted by encoded
//! length first, then bytewise. Integers stay integers and floats stay floats,
//! so `decode(encode(x)) == x` for every value the entities produce.
//!
//! Every derived identifier and every signature covers these bytes. A change
//! in key order, an omitted field or an extra field changes the hash.

use crate::errors::CodecError;
use ciborium::value::Value as CborValue;
use serde_json::{Map, Number, Value};

/// Maximum encoded size of a generic payload (16 KiB).
pub const MAX_ENCODED_BYTES: usize = 16 * 1024;

/// Encodes `value` and enforces the generic payload limit.
pub fn encode(value: &Value) -> Result<Vec<u8>, CodecError> {
    let bytes = encode_unbounded(value)?;
    if bytes.len() > MAX_ENCODED_BYTES {
        return Err(CodecError::MaxEncodedBytesReached {
            size: bytes.len(),
            max_size: MAX_ENCODED_BYTES,
        });
    }
    Ok(bytes)
}

/// Encodes `value` without a size limit. Callers apply their own limit.
pub fn encode_unbounded(value: &Value) -> Result<Vec<u8>, CodecError> {
    let canonical = to_cbor(value)?;
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(&canonical, &mut bytes).map_err(|err| match err {
        ciborium::ser::Error::Io(err) => CodecError::Encode(err.to_string()),
        ciborium::ser::Error::Value(msg) => CodecError::Encode(msg),
    })?;
    Ok(bytes)
}

/// Decodes canonical bytes back into a JSON value.
///
/// The whole buffer must be consumed by exactly one top-level item.
pub fn decode(bytes: &[u8]) -> Result<Value, CodecError> {
    let mut reader = bytes;
    let item: CborValue = ciborium::de::from_reader(&mut reader).map_err(|err| match err {
        ciborium::de::Error::Io(err) => CodecError::Decode(err.to_string()),
        ciborium::de::Error::Syntax(offset) => {
            CodecError::Decode(format!("syntax error at byte {offset}"))
        }
        ciborium::de::Error::Semantic(_, msg) => CodecError::Decode(msg),
        ciborium::de::Error::RecursionLimitExceeded => {
            CodecError::Decode("recursion limit exceeded".to_string())
        }
    })?;

    if !reader.is_empty() {
        return Err(CodecError::Decode(format!(
            "{} trailing bytes after top-level item",
            reader.len()
        )));
    }

    from_cbor(item)
}

fn canonical_key_order(a: &str, b: &str) -> std::cmp::Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| a.as_bytes().cmp(b.as_bytes()))
}

fn to_cbor(value: &Value) -> Result<CborValue, CodecError> {
    let converted = match value {
        Value::Null => CborValue::Null,
        Value::Bool(flag) => CborValue::Bool(*flag),
        Value::Number(number) => {
            if let Some(unsigned) = number.as_u64() {
                CborValue::Integer(unsigned.into())
            } else if let Some(signed) = number.as_i64() {
                CborValue::Integer(signed.into())
            } else if let Some(float) = number.as_f64() {
                CborValue::Float(float)
            } else {
                return Err(CodecError::UnsupportedValue(number.to_string()));
            }
        }
        Value::String(text) => CborValue::Text(text.clone()),
        Value::Array(items) => CborValue::Array(
            items
                .iter()
                .map(to_cbor)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| canonical_key_order(a, b));

            let mut entries = Vec::with_capacity(keys.len());
            for key in keys {
                entries.push((CborValue::Text(key.clone()), to_cbor(&map[key])?));
            }
            CborValue::Map(entries)
        }
    };
    Ok(converted)
}

fn from_cbor(value: CborValue) -> Result<Value, CodecError> {
    let converted = match value {
        CborValue::Null => Value::Null,
        CborValue::Bool(flag) => Value::Bool(flag),
        CborValue::Integer(integer) => {
            let wide = i128::from(integer);
            if let Ok(unsigned) = u64::try_from(wide) {
                Value::Number(unsigned.into())
            } else if let Ok(signed) = i64::try_from(wide) {
                Value::Number(signed.into())
            } else {
                return Err(CodecError::UnsupportedValue(format!(
                    "integer {wide} out of range"
                )));
            }
        }
        CborValue::Float(float) => Number::from_f64(float)
            .map(Value::Number)
            .ok_or_else(|| CodecError::UnsupportedValue(format!("float {float}")))?,
        CborValue::Text(text) => Value::String(text),
        CborValue::Array(items) => Value::Array(
            items
                .into_iter()
                .map(from_cbor)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        CborValue::Map(entries) => {
            let mut map = Map::new();
            for (key, item) in entries {
                let CborValue::Text(key) = key else {
                    return Err(CodecError::UnsupportedValue(
                        "non-text map key".to_string(),
                    ));
                };
                map.insert(key, from_cbor(item)?);
            }
            Value::Object(map)
        }
        CborValue::Bytes(_) => {
            return Err(CodecError::UnsupportedValue("byte string".to_string()))
        }
        CborValue::Tag(tag, _) => {
            return Err(CodecError::UnsupportedValue(format!("tag {tag}")))
        }
        _ => return Err(CodecError::UnsupportedValue("unknown item".to_string())),
    };
    Ok(converted)
}
