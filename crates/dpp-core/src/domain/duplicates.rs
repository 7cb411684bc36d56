//! # Batch-Local Duplicate Detection
//!
//! Both finders work on raw transitions and return every colliding member
//! in batch order, never just one of them.
//!
//! - By id: fingerprint `type:id`.
//! - By unique index: within one document type, Create and Replace
//!   transitions whose indexed values (joined with `:`) are equal on any
//!   unique index.

use super::data_contract::DataContract;
use super::document_transition::Action;
use super::integral;
use super::property_path;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};

fn text_of(raw: &Value, key: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Transitions sharing a `type:id` fingerprint with another transition.
pub fn find_duplicates_by_id(raw_transitions: &[Value]) -> Vec<&Value> {
    let fingerprints: Vec<String> = raw_transitions
        .iter()
        .map(|raw| format!("{}:{}", text_of(raw, "$type"), text_of(raw, "$id")))
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for fingerprint in &fingerprints {
        *counts.entry(fingerprint.as_str()).or_default() += 1;
    }

    raw_transitions
        .iter()
        .zip(&fingerprints)
        .filter(|(_, fingerprint)| counts[fingerprint.as_str()] > 1)
        .map(|(raw, _)| raw)
        .collect()
}

/// Values of `index`'s properties in index order. Missing values read as
/// empty.
pub fn index_values(raw: &Value, index: &Value) -> Vec<String> {
    let Some(object) = raw.as_object() else {
        return Vec::new();
    };
    index
        .get("properties")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|property| property.as_object()?.keys().next())
        .map(|name| match property_path::get(object, name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        })
        .collect()
}

/// Create and Replace transitions colliding on a unique index of their type.
pub fn find_duplicates_by_indices<'a>(
    raw_transitions: &'a [Value],
    contract: &DataContract,
) -> Vec<&'a Value> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (position, raw) in raw_transitions.iter().enumerate() {
        let action = raw
            .get("$action")
            .and_then(integral::as_u64)
            .and_then(Action::from_code);
        if matches!(action, Some(Action::Create | Action::Replace)) {
            groups
                .entry(text_of(raw, "$type"))
                .or_default()
                .push(position);
        }
    }

    let mut flagged = BTreeSet::new();
    for (document_type, positions) in &groups {
        let unique_indices = contract.unique_indices(document_type);
        if unique_indices.is_empty() || positions.len() < 2 {
            continue;
        }

        for (offset, &first) in positions.iter().enumerate() {
            for &second in &positions[offset + 1..] {
                let collides = unique_indices.iter().any(|index| {
                    index_values(&raw_transitions[first], index)
                        == index_values(&raw_transitions[second], index)
                });
                if collides {
                    flagged.insert(first);
                    flagged.insert(second);
                }
            }
        }
    }

    flagged
        .into_iter()
        .map(|position| &raw_transitions[position])
        .collect()
}
