//! Dotted property paths (`a.b.0.c`) over object maps.

use crate::errors::DppError;
use serde_json::{Map, Value};

/// Reads the value at `path`. Numeric segments index into arrays.
pub fn get<'a>(root: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = root.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Writes `value` at `path`, creating intermediate objects.
pub fn set(root: &mut Map<String, Value>, path: &str, value: Value) -> Result<(), DppError> {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(DppError::MalformedObject("empty property path".to_string()));
    };

    let mut current = root;
    for segment in parents {
        current = current
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| {
                DppError::MalformedObject(format!("`{segment}` of `{path}` is not an object"))
            })?;
    }
    current.insert((*last).to_string(), value);
    Ok(())
}
