//! # Schema Enrichment
//!
//! Merges system-property schemas into every document schema of a contract
//! so one validator call checks user and system constraints together.
//!
//! Base properties override user properties of the same name; `required`
//! lists are unioned (base first); excluded properties are removed from
//! both.

use super::data_contract::DataContract;
use serde_json::Value;

/// Clone of `contract` with `base_schemas` merged into each document schema.
pub fn enrich_data_contract_with_base_schema(
    contract: &DataContract,
    base_schemas: &[&Value],
    exclude_properties: &[&str],
) -> DataContract {
    let mut documents = contract.documents().clone();

    for schema in documents.values_mut() {
        let Value::Object(document_schema) = schema else {
            continue;
        };

        let mut properties = document_schema
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let mut required: Vec<Value> = Vec::new();

        for base in base_schemas {
            if let Some(base_properties) = base.get("properties").and_then(Value::as_object) {
                for (name, property) in base_properties {
                    properties.insert(name.clone(), property.clone());
                }
            }
            union_into(&mut required, base.get("required"));
        }
        union_into(&mut required, document_schema.get("required"));

        for name in exclude_properties {
            properties.remove(*name);
            required.retain(|item| item.as_str() != Some(*name));
        }

        document_schema.insert("properties".into(), Value::Object(properties));
        document_schema.insert("required".into(), Value::Array(required));
    }

    let mut enriched = contract.clone();
    enriched.set_documents(documents);
    enriched
}

fn union_into(required: &mut Vec<Value>, extra: Option<&Value>) {
    for item in extra.and_then(Value::as_array).into_iter().flatten() {
        if !required.contains(item) {
            required.push(item.clone());
        }
    }
}
