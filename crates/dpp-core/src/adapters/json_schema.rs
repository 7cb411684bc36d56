//! Draft-07 JSON-Schema validator.
//!
//! Covers the keyword set the protocol schemas and user document schemas
//! use. Every violation is reported, in schema keyword order. `$ref`s are
//! resolved either inside the current root (`#/...`) or against the
//! additional schemas by their `$id` (`contract://...#/...`), which then
//! becomes the root for nested local references.
//!
//! Keywords that only annotate (`$schema`, `$id`, `definitions`, `format`,
//! `contentEncoding`, `title`, `description`) are ignored.

use crate::domain::limits::MAX_SCHEMA_RECURSION;
use crate::domain::validation_result::ValidationResult;
use crate::errors::JsonSchemaError;
use crate::ports::outbound::JsonSchemaValidator;
use parking_lot::Mutex;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};

/// [`JsonSchemaValidator`] for draft-07 schemas.
///
/// Compiled `pattern`s are cached for the lifetime of the validator.
#[derive(Debug, Default)]
pub struct DraftSchemaValidator {
    regex_cache: Mutex<HashMap<String, Regex>>,
}

impl DraftSchemaValidator {
    /// Validator with an empty regex cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn regex(&self, pattern: &str) -> Option<Regex> {
        let mut cache = self.regex_cache.lock();
        if let Some(regex) = cache.get(pattern) {
            return Some(regex.clone());
        }
        let regex = Regex::new(pattern).ok()?;
        cache.insert(pattern.to_string(), regex.clone());
        Some(regex)
    }
}

impl JsonSchemaValidator for DraftSchemaValidator {
    fn validate(
        &self,
        schema: &Value,
        data: &Value,
        additional_schemas: &BTreeMap<String, Value>,
    ) -> ValidationResult {
        let walker = Walker {
            validator: self,
            additional_schemas,
        };
        let mut errors = Vec::new();
        walker.check(schema, schema, data, "", "#", 0, &mut errors);
        ValidationResult::with_errors(errors.into_iter().map(Into::into).collect())
    }
}

struct Walker<'a> {
    validator: &'a DraftSchemaValidator,
    additional_schemas: &'a BTreeMap<String, Value>,
}

impl<'a> Walker<'a> {
    /// Appends every violation of `instance` against `schema` to `errors`.
    #[allow(clippy::too_many_arguments)]
    fn check(
        &self,
        root: &'a Value,
        schema: &'a Value,
        instance: &Value,
        instance_path: &str,
        schema_path: &str,
        depth: usize,
        errors: &mut Vec<JsonSchemaError>,
    ) {
        if depth > MAX_SCHEMA_RECURSION {
            errors.push(JsonSchemaError::new(
                "$ref",
                instance_path,
                schema_path,
                "maximum schema recursion reached",
            ));
            return;
        }

        let schema_object = match schema {
            Value::Bool(true) => return,
            Value::Bool(false) => {
                errors.push(JsonSchemaError::new(
                    "false schema",
                    instance_path,
                    schema_path,
                    "boolean schema is false",
                ));
                return;
            }
            Value::Object(object) => object,
            _ => return,
        };

        // Draft-07: a `$ref` hides its sibling keywords.
        if let Some(reference) = schema_object.get("$ref").and_then(Value::as_str) {
            let ref_path = format!("{schema_path}/$ref");
            match self.resolve(root, reference) {
                Some((target_root, target)) => self.check(
                    target_root,
                    target,
                    instance,
                    instance_path,
                    &ref_path,
                    depth + 1,
                    errors,
                ),
                None => errors.push(
                    JsonSchemaError::new(
                        "$ref",
                        instance_path,
                        ref_path,
                        format!("can't resolve reference {reference}"),
                    )
                    .with_params(json!({ "ref": reference })),
                ),
            }
            return;
        }

        let ctx = Node {
            root,
            schema: schema_object,
            instance_path,
            schema_path,
            depth,
        };

        self.check_generic(&ctx, instance, errors);
        match instance {
            Value::Object(object) => self.check_object(&ctx, object, errors),
            Value::Array(items) => self.check_array(&ctx, items, errors),
            Value::String(text) => self.check_string(&ctx, text, errors),
            Value::Number(_) => self.check_number(&ctx, instance, errors),
            _ => {}
        }
        self.check_combinators(&ctx, instance, errors);
    }

    fn is_valid(&self, root: &'a Value, schema: &'a Value, instance: &Value, depth: usize) -> bool {
        let mut errors = Vec::new();
        self.check(root, schema, instance, "", "#", depth, &mut errors);
        errors.is_empty()
    }

    fn resolve(&self, root: &'a Value, reference: &str) -> Option<(&'a Value, &'a Value)> {
        let (base, fragment) = match reference.split_once('#') {
            Some((base, fragment)) => (base, fragment),
            None => (reference, ""),
        };

        let target_root = if base.is_empty() || root.get("$id").and_then(Value::as_str) == Some(base)
        {
            root
        } else {
            self.additional_schemas.get(base)?
        };

        let target = if fragment.is_empty() {
            target_root
        } else {
            target_root.pointer(fragment)?
        };
        Some((target_root, target))
    }

    fn check_generic(&self, ctx: &Node<'a, '_>, instance: &Value, errors: &mut Vec<JsonSchemaError>) {
        if let Some(expected) = ctx.schema.get("type") {
            let allowed: Vec<&str> = match expected {
                Value::String(name) => vec![name.as_str()],
                Value::Array(names) => names.iter().filter_map(Value::as_str).collect(),
                _ => Vec::new(),
            };
            if !allowed.is_empty() && !allowed.iter().any(|name| has_type(instance, name)) {
                errors.push(
                    ctx.error("type", format!("must be {}", allowed.join(",")))
                        .with_params(json!({ "type": expected })),
                );
            }
        }

        if let Some(Value::Array(options)) = ctx.schema.get("enum") {
            if !options.iter().any(|option| json_equal(option, instance)) {
                errors.push(
                    ctx.error("enum", "must be equal to one of the allowed values")
                        .with_params(json!({ "allowedValues": options })),
                );
            }
        }

        if let Some(expected) = ctx.schema.get("const") {
            if !json_equal(expected, instance) {
                errors.push(
                    ctx.error("const", "must be equal to constant")
                        .with_params(json!({ "allowedValue": expected })),
                );
            }
        }
    }

    fn check_object(
        &self,
        ctx: &Node<'a, '_>,
        object: &Map<String, Value>,
        errors: &mut Vec<JsonSchemaError>,
    ) {
        if let Some(Value::Array(required)) = ctx.schema.get("required") {
            for name in required.iter().filter_map(Value::as_str) {
                if !object.contains_key(name) {
                    errors.push(
                        ctx.error("required", format!("must have required property '{name}'"))
                            .with_params(json!({ "missingProperty": name })),
                    );
                }
            }
        }

        if let Some(min) = ctx.schema.get("minProperties").and_then(Value::as_u64) {
            if (object.len() as u64) < min {
                errors.push(
                    ctx.error("minProperties", format!("must NOT have fewer than {min} properties"))
                        .with_params(json!({ "limit": min })),
                );
            }
        }
        if let Some(max) = ctx.schema.get("maxProperties").and_then(Value::as_u64) {
            if object.len() as u64 > max {
                errors.push(
                    ctx.error("maxProperties", format!("must NOT have more than {max} properties"))
                        .with_params(json!({ "limit": max })),
                );
            }
        }

        if let Some(names_schema) = ctx.schema.get("propertyNames") {
            for name in object.keys() {
                self.check(
                    ctx.root,
                    names_schema,
                    &Value::String(name.clone()),
                    &ctx.child_instance(name),
                    &ctx.child_schema("propertyNames"),
                    ctx.depth + 1,
                    errors,
                );
            }
        }

        let properties = ctx.schema.get("properties").and_then(Value::as_object);
        let pattern_properties: Vec<(Regex, &'a str, &'a Value)> = ctx
            .schema
            .get("patternProperties")
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
            .filter_map(|(pattern, schema)| {
                Some((self.validator.regex(pattern)?, pattern.as_str(), schema))
            })
            .collect();
        let additional = ctx.schema.get("additionalProperties");

        for (name, value) in object {
            let mut matched = false;

            if let Some(property_schema) = properties.and_then(|properties| properties.get(name)) {
                matched = true;
                self.check(
                    ctx.root,
                    property_schema,
                    value,
                    &ctx.child_instance(name),
                    &format!("{}/properties/{}", ctx.schema_path, escape(name)),
                    ctx.depth + 1,
                    errors,
                );
            }

            for (regex, pattern, pattern_schema) in &pattern_properties {
                if regex.is_match(name) {
                    matched = true;
                    self.check(
                        ctx.root,
                        *pattern_schema,
                        value,
                        &ctx.child_instance(name),
                        &format!("{}/patternProperties/{}", ctx.schema_path, escape(pattern)),
                        ctx.depth + 1,
                        errors,
                    );
                }
            }

            if matched {
                continue;
            }
            match additional {
                Some(Value::Bool(false)) => errors.push(
                    ctx.error("additionalProperties", "must NOT have additional properties")
                        .with_params(json!({ "additionalProperty": name })),
                ),
                Some(additional_schema @ Value::Object(_)) => self.check(
                    ctx.root,
                    additional_schema,
                    value,
                    &ctx.child_instance(name),
                    &ctx.child_schema("additionalProperties"),
                    ctx.depth + 1,
                    errors,
                ),
                _ => {}
            }
        }
    }

    fn check_array(&self, ctx: &Node<'a, '_>, items: &[Value], errors: &mut Vec<JsonSchemaError>) {
        if let Some(min) = ctx.schema.get("minItems").and_then(Value::as_u64) {
            if (items.len() as u64) < min {
                errors.push(
                    ctx.error("minItems", format!("must NOT have fewer than {min} items"))
                        .with_params(json!({ "limit": min })),
                );
            }
        }
        if let Some(max) = ctx.schema.get("maxItems").and_then(Value::as_u64) {
            if items.len() as u64 > max {
                errors.push(
                    ctx.error("maxItems", format!("must NOT have more than {max} items"))
                        .with_params(json!({ "limit": max })),
                );
            }
        }

        if ctx.schema.get("uniqueItems") == Some(&Value::Bool(true)) {
            'outer: for (i, first) in items.iter().enumerate() {
                for (j, second) in items.iter().enumerate().skip(i + 1) {
                    if json_equal(first, second) {
                        errors.push(
                            ctx.error(
                                "uniqueItems",
                                format!("must NOT have duplicate items (items ## {j} and {i} are identical)"),
                            )
                            .with_params(json!({ "i": i, "j": j })),
                        );
                        break 'outer;
                    }
                }
            }
        }

        match ctx.schema.get("items") {
            Some(Value::Array(tuple)) => {
                for (index, (item, item_schema)) in items.iter().zip(tuple).enumerate() {
                    self.check(
                        ctx.root,
                        item_schema,
                        item,
                        &ctx.child_instance(&index.to_string()),
                        &format!("{}/items/{index}", ctx.schema_path),
                        ctx.depth + 1,
                        errors,
                    );
                }
                match ctx.schema.get("additionalItems") {
                    Some(Value::Bool(false)) if items.len() > tuple.len() => errors.push(
                        ctx.error(
                            "additionalItems",
                            format!("must NOT have more than {} items", tuple.len()),
                        )
                        .with_params(json!({ "limit": tuple.len() })),
                    ),
                    Some(extra_schema @ Value::Object(_)) => {
                        for (index, item) in items.iter().enumerate().skip(tuple.len()) {
                            self.check(
                                ctx.root,
                                extra_schema,
                                item,
                                &ctx.child_instance(&index.to_string()),
                                &ctx.child_schema("additionalItems"),
                                ctx.depth + 1,
                                errors,
                            );
                        }
                    }
                    _ => {}
                }
            }
            Some(item_schema) => {
                for (index, item) in items.iter().enumerate() {
                    self.check(
                        ctx.root,
                        item_schema,
                        item,
                        &ctx.child_instance(&index.to_string()),
                        &ctx.child_schema("items"),
                        ctx.depth + 1,
                        errors,
                    );
                }
            }
            None => {}
        }

        if let Some(contains) = ctx.schema.get("contains") {
            if !items
                .iter()
                .any(|item| self.is_valid(ctx.root, contains, item, ctx.depth + 1))
            {
                errors.push(ctx.error("contains", "must contain at least 1 valid item"));
            }
        }
    }

    fn check_string(&self, ctx: &Node<'a, '_>, text: &str, errors: &mut Vec<JsonSchemaError>) {
        let length = text.chars().count() as u64;
        if let Some(min) = ctx.schema.get("minLength").and_then(Value::as_u64) {
            if length < min {
                errors.push(
                    ctx.error("minLength", format!("must NOT have fewer than {min} characters"))
                        .with_params(json!({ "limit": min })),
                );
            }
        }
        if let Some(max) = ctx.schema.get("maxLength").and_then(Value::as_u64) {
            if length > max {
                errors.push(
                    ctx.error("maxLength", format!("must NOT have more than {max} characters"))
                        .with_params(json!({ "limit": max })),
                );
            }
        }

        if let Some(pattern) = ctx.schema.get("pattern").and_then(Value::as_str) {
            let matches = self
                .validator
                .regex(pattern)
                .is_some_and(|regex| regex.is_match(text));
            if !matches {
                errors.push(
                    ctx.error("pattern", format!("must match pattern \"{pattern}\""))
                        .with_params(json!({ "pattern": pattern })),
                );
            }
        }
    }

    fn check_number(&self, ctx: &Node<'a, '_>, instance: &Value, errors: &mut Vec<JsonSchemaError>) {
        let Some(number) = instance.as_f64() else {
            return;
        };
        let bound = |keyword: &str| ctx.schema.get(keyword).and_then(Value::as_f64);

        let comparisons: [(&str, &str, fn(f64, f64) -> bool); 4] = [
            ("minimum", ">=", |n, limit| n >= limit),
            ("maximum", "<=", |n, limit| n <= limit),
            ("exclusiveMinimum", ">", |n, limit| n > limit),
            ("exclusiveMaximum", "<", |n, limit| n < limit),
        ];
        for (keyword, comparison, holds) in comparisons {
            if let Some(limit) = bound(keyword) {
                if !holds(number, limit) {
                    errors.push(
                        ctx.error(keyword, format!("must be {comparison} {limit}"))
                            .with_params(json!({ "comparison": comparison, "limit": limit })),
                    );
                }
            }
        }

        if let Some(divisor) = bound("multipleOf") {
            let multiple = match (instance.as_i64(), ctx.schema.get("multipleOf").and_then(Value::as_i64)) {
                (Some(value), Some(divisor)) if divisor != 0 => value.checked_rem(divisor) == Some(0),
                _ => divisor != 0.0 && (number / divisor).fract() == 0.0,
            };
            if !multiple {
                errors.push(
                    ctx.error("multipleOf", format!("must be multiple of {divisor}"))
                        .with_params(json!({ "multipleOf": divisor })),
                );
            }
        }
    }

    fn check_combinators(
        &self,
        ctx: &Node<'a, '_>,
        instance: &Value,
        errors: &mut Vec<JsonSchemaError>,
    ) {
        if let Some(Value::Array(schemas)) = ctx.schema.get("allOf") {
            for (index, sub_schema) in schemas.iter().enumerate() {
                self.check(
                    ctx.root,
                    sub_schema,
                    instance,
                    ctx.instance_path,
                    &format!("{}/allOf/{index}", ctx.schema_path),
                    ctx.depth + 1,
                    errors,
                );
            }
        }

        if let Some(Value::Array(schemas)) = ctx.schema.get("anyOf") {
            if !schemas
                .iter()
                .any(|sub_schema| self.is_valid(ctx.root, sub_schema, instance, ctx.depth + 1))
            {
                errors.push(ctx.error("anyOf", "must match a schema in anyOf"));
            }
        }

        if let Some(Value::Array(schemas)) = ctx.schema.get("oneOf") {
            let passing = schemas
                .iter()
                .filter(|sub_schema| self.is_valid(ctx.root, *sub_schema, instance, ctx.depth + 1))
                .count();
            if passing != 1 {
                errors.push(
                    ctx.error("oneOf", "must match exactly one schema in oneOf")
                        .with_params(json!({ "passingSchemas": passing })),
                );
            }
        }

        if let Some(not_schema) = ctx.schema.get("not") {
            if self.is_valid(ctx.root, not_schema, instance, ctx.depth + 1) {
                errors.push(ctx.error("not", "must NOT be valid"));
            }
        }

        if let Some(condition) = ctx.schema.get("if") {
            let (branch, keyword) = if self.is_valid(ctx.root, condition, instance, ctx.depth + 1) {
                (ctx.schema.get("then"), "then")
            } else {
                (ctx.schema.get("else"), "else")
            };
            if let Some(branch) = branch {
                self.check(
                    ctx.root,
                    branch,
                    instance,
                    ctx.instance_path,
                    &ctx.child_schema(keyword),
                    ctx.depth + 1,
                    errors,
                );
            }
        }
    }
}

/// Schema object being applied at one instance location.
struct Node<'a, 'p> {
    root: &'a Value,
    schema: &'a Map<String, Value>,
    instance_path: &'p str,
    schema_path: &'p str,
    depth: usize,
}

impl Node<'_, '_> {
    fn error(&self, keyword: &str, message: impl Into<String>) -> JsonSchemaError {
        JsonSchemaError::new(
            keyword,
            self.instance_path,
            format!("{}/{keyword}", self.schema_path),
            message,
        )
    }

    fn child_instance(&self, segment: &str) -> String {
        format!("{}/{}", self.instance_path, escape(segment))
    }

    fn child_schema(&self, keyword: &str) -> String {
        format!("{}/{keyword}", self.schema_path)
    }
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn has_type(instance: &Value, name: &str) -> bool {
    match name {
        "null" => instance.is_null(),
        "boolean" => instance.is_boolean(),
        "object" => instance.is_object(),
        "array" => instance.is_array(),
        "string" => instance.is_string(),
        "number" => instance.is_number(),
        "integer" => {
            instance.is_i64()
                || instance.is_u64()
                || instance.as_f64().is_some_and(|number| number.fract() == 0.0)
        }
        _ => false,
    }
}

/// Structural equality with numbers compared by value, so `1` equals `1.0`.
fn json_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64(), a.as_u64(), b.as_u64()) {
            (Some(a), Some(b), _, _) => a == b,
            (_, _, Some(a), Some(b)) => a == b,
            _ => a.as_f64() == b.as_f64(),
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| json_equal(a, b))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| json_equal(value, other)))
        }
        _ => left == right,
    }
}
