//! # Encoded Properties
//!
//! Properties whose schema declares `contentEncoding` hold binary data.
//!
//! | Form | Binary value |
//! |------|--------------|
//! | Native (`to_object`) | JSON array of byte integers |
//! | Text (`to_json`) | String in the declared encoding |
//!
//! Paths use `a.b` for nested objects, `a[]` for every element of a
//! homogeneous array and `a[2]` for a fixed-tuple position.

use crate::errors::DppError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Supported `contentEncoding` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentEncoding {
    /// RFC 4648 standard alphabet with padding.
    Base64,
    /// Lowercase hex.
    Hex,
}

impl ContentEncoding {
    /// Parses a schema `contentEncoding` value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "base64" => Some(Self::Base64),
            "hex" => Some(Self::Hex),
            _ => None,
        }
    }

    /// Schema name of the encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base64 => "base64",
            Self::Hex => "hex",
        }
    }

    /// Bytes to text.
    pub fn encode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Base64 => STANDARD.encode(bytes),
            Self::Hex => hex::encode(bytes),
        }
    }

    /// Text to bytes.
    pub fn decode(&self, text: &str) -> Option<Vec<u8>> {
        match self {
            Self::Base64 => STANDARD.decode(text).ok(),
            Self::Hex => hex::decode(text).ok(),
        }
    }
}

impl fmt::Display for ContentEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flattened map from property path to its encoding.
pub type EncodedProperties = BTreeMap<String, ContentEncoding>;

/// Flattens every `contentEncoding` declared under a document schema's
/// `properties`.
pub fn flatten_encoded_properties(document_schema: &Value) -> EncodedProperties {
    let mut encoded = EncodedProperties::new();
    if let Some(properties) = document_schema.get("properties").and_then(Value::as_object) {
        visit_properties(properties, "", &mut encoded);
    }
    encoded
}

fn visit_properties(properties: &Map<String, Value>, prefix: &str, out: &mut EncodedProperties) {
    for (name, schema) in properties {
        visit_property(schema, format!("{prefix}{name}"), out);
    }
}

fn visit_property(schema: &Value, path: String, out: &mut EncodedProperties) {
    if let Some(encoding) = schema
        .get("contentEncoding")
        .and_then(Value::as_str)
        .and_then(ContentEncoding::from_name)
    {
        out.insert(path.clone(), encoding);
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        visit_properties(properties, &format!("{path}."), out);
    }

    match schema.get("items") {
        Some(Value::Array(tuple)) => {
            for (position, item) in tuple.iter().enumerate() {
                visit_property(item, format!("{path}[{position}]"), out);
            }
        }
        Some(item @ Value::Object(_)) => visit_property(item, format!("{path}[]"), out),
        _ => {}
    }
}

// =============================================================================
// FORM CONVERSION
// =============================================================================

enum Segment<'a> {
    Key(&'a str),
    Each,
    Index(usize),
}

fn parse_path(path: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        let (name, mut brackets) = match part.find('[') {
            Some(start) => (&part[..start], &part[start..]),
            None => (part, ""),
        };
        segments.push(Segment::Key(name));

        while let Some(end) = brackets.find(']') {
            let inner = &brackets[1..end];
            if inner.is_empty() {
                segments.push(Segment::Each);
            } else if let Ok(position) = inner.parse() {
                segments.push(Segment::Index(position));
            }
            brackets = &brackets[end + 1..];
        }
    }
    segments
}

type Leaf<'f> = dyn FnMut(&mut Value) -> Result<(), DppError> + 'f;

fn walk(value: &mut Value, segments: &[Segment<'_>], leaf: &mut Leaf<'_>) -> Result<(), DppError> {
    let Some((segment, rest)) = segments.split_first() else {
        return leaf(value);
    };
    match (segment, value) {
        (Segment::Key(key), Value::Object(map)) => match map.get_mut(*key) {
            Some(child) => walk(child, rest, leaf),
            None => Ok(()),
        },
        (Segment::Each, Value::Array(items)) => {
            for item in items.iter_mut() {
                walk(item, rest, leaf)?;
            }
            Ok(())
        }
        (Segment::Index(position), Value::Array(items)) => match items.get_mut(*position) {
            Some(item) => walk(item, rest, leaf),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}

fn walk_map(
    data: &mut Map<String, Value>,
    path: &str,
    leaf: &mut Leaf<'_>,
) -> Result<(), DppError> {
    let segments = parse_path(path);
    let Some((Segment::Key(first), rest)) = segments.split_first() else {
        return Ok(());
    };
    match data.get_mut(*first) {
        Some(child) => walk(child, rest, leaf),
        None => Ok(()),
    }
}

fn as_byte_array(value: &Value) -> Option<Vec<u8>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_u64().and_then(|byte| u8::try_from(byte).ok()))
        .collect()
}

/// Rewrites binary values (byte arrays) into their text form. Values that
/// are not byte arrays are left for schema validation to report.
pub fn to_text_form(data: &mut Map<String, Value>, encoded: &EncodedProperties) {
    for (path, encoding) in encoded {
        let mut leaf = |value: &mut Value| -> Result<(), DppError> {
            if let Some(bytes) = as_byte_array(value) {
                *value = Value::String(encoding.encode(&bytes));
            }
            Ok(())
        };
        // The leaf never fails.
        let _ = walk_map(data, path, &mut leaf);
    }
}

/// Rewrites text values into byte arrays. Undecodable text is an error.
pub fn to_native_form(
    data: &mut Map<String, Value>,
    encoded: &EncodedProperties,
) -> Result<(), DppError> {
    for (path, encoding) in encoded {
        let mut leaf = |value: &mut Value| -> Result<(), DppError> {
            if let Value::String(text) = value {
                let bytes = encoding.decode(text).ok_or_else(|| {
                    DppError::MalformedObject(format!("`{path}` is not valid {encoding}"))
                })?;
                *value = Value::Array(bytes.into_iter().map(Value::from).collect());
            }
            Ok(())
        };
        walk_map(data, path, &mut leaf)?;
    }
    Ok(())
}
