//! Data contract nesting limit.
//!
//! Depth counts every object and array level of the raw contract after
//! replacing each local `$ref` with its target. Circular or dangling
//! references are reported as schema errors on `$ref`.

use crate::domain::limits::MAX_SCHEMA_DEPTH;
use crate::domain::validation_result::ValidationResult;
use crate::errors::{ConsensusError, JsonSchemaError};
use serde_json::{json, Value};

/// Checks the dereferenced depth of `raw_data_contract`.
pub fn validate_data_contract_max_depth(raw_data_contract: &Value) -> ValidationResult {
    let mut walker = DepthWalker {
        root: raw_data_contract,
        ref_stack: Vec::new(),
    };

    match walker.depth(raw_data_contract, 0) {
        Err(error) => ValidationResult::from(ConsensusError::from(error)),
        Ok(depth) if depth > MAX_SCHEMA_DEPTH => {
            ValidationResult::from(ConsensusError::DataContractMaxDepthExceeded {
                depth,
                max_depth: MAX_SCHEMA_DEPTH,
            })
        }
        Ok(_) => ValidationResult::new(),
    }
}

struct DepthWalker<'a> {
    root: &'a Value,
    ref_stack: Vec<&'a str>,
}

impl<'a> DepthWalker<'a> {
    /// Deepest level below `value`, stopping early past the limit.
    fn depth(&mut self, value: &'a Value, current: usize) -> Result<usize, JsonSchemaError> {
        let level = current + 1;
        let children: Box<dyn Iterator<Item = &'a Value> + 'a> = match value {
            Value::Object(object) => {
                if let Some(reference) = object.get("$ref").and_then(Value::as_str) {
                    if let Some(pointer) = reference.strip_prefix('#') {
                        return self.follow(reference, pointer, current);
                    }
                }
                Box::new(object.values())
            }
            Value::Array(items) => Box::new(items.iter()),
            _ => return Ok(current),
        };

        if level > MAX_SCHEMA_DEPTH {
            return Ok(level);
        }

        let mut deepest = level;
        for child in children {
            deepest = deepest.max(self.depth(child, level)?);
            if deepest > MAX_SCHEMA_DEPTH {
                break;
            }
        }
        Ok(deepest)
    }

    fn follow(
        &mut self,
        reference: &'a str,
        pointer: &str,
        current: usize,
    ) -> Result<usize, JsonSchemaError> {
        if self.ref_stack.contains(&reference) {
            return Err(ref_error(reference, "circular reference"));
        }
        let target = self
            .root
            .pointer(pointer)
            .ok_or_else(|| ref_error(reference, "can't resolve reference"))?;

        self.ref_stack.push(reference);
        let depth = self.depth(target, current);
        self.ref_stack.pop();
        depth
    }
}

fn ref_error(reference: &str, message: &str) -> JsonSchemaError {
    JsonSchemaError::new("$ref", "", "#/$ref", format!("{message} {reference}"))
        .with_params(json!({ "ref": reference }))
}
