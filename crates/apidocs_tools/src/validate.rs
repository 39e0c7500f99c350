//! Argument validation against a tool's JSON input schema.
//!
//! Covers the subset of JSON Schema that tool declarations use: `type`
//! (single or list), `properties`, `required`, `additionalProperties: false`,
//! `enum`, `minimum`/`maximum`, `minLength` and array `items`. Unknown
//! keywords are ignored.

use crate::error::ValidationErrors;
use serde_json::{Map, Value};

/// Validates `args` against `schema`, collecting every violation.
///
/// ```
/// use apidocs_tools::validate::validate_arguments;
/// use serde_json::json;
///
/// let schema = json!({
///     "type": "object",
///     "properties": {"limit": {"type": "integer", "minimum": 1}},
///     "required": ["limit"]
/// });
/// assert!(validate_arguments(&schema, &json!({"limit": 5})).is_ok());
///
/// let errors = validate_arguments(&schema, &json!({"limit": 0})).unwrap_err();
/// assert_eq!(errors.fields()[0].field, "limit");
/// ```
///
/// # Errors
///
/// Returns every field that failed, in schema order.
pub fn validate_arguments(schema: &Value, args: &Value) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check(schema, args, "", &mut errors);
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn check(schema: &Value, value: &Value, path: &str, errors: &mut ValidationErrors) {
    let Some(schema) = schema.as_object() else {
        return;
    };

    if let Some(expected) = schema.get("type")
        && !type_matches(expected, value)
    {
        errors.push(
            display_path(path),
            format!("expected {}, got {}", describe_type(expected), json_type(value)),
        );
        return;
    }

    if let Some(Value::Array(allowed)) = schema.get("enum")
        && !allowed.contains(value)
    {
        let options: Vec<String> = allowed.iter().map(ToString::to_string).collect();
        errors.push(
            display_path(path),
            format!("must be one of [{}], got {value}", options.join(", ")),
        );
    }

    match value {
        Value::Object(map) => check_object(schema, map, path, errors),
        Value::Array(items) => {
            if let Some(item_schema) = schema.get("items") {
                for (index, item) in items.iter().enumerate() {
                    check(item_schema, item, &format!("{path}[{index}]"), errors);
                }
            }
        }
        Value::Number(number) => {
            if let Some(value) = number.as_f64() {
                check_range(schema, value, path, errors);
            }
        }
        Value::String(text) => {
            if let Some(min) = schema.get("minLength").and_then(Value::as_u64)
                && (text.chars().count() as u64) < min
            {
                errors.push(
                    display_path(path),
                    format!("must be at least {min} characters"),
                );
            }
        }
        Value::Null | Value::Bool(_) => {}
    }
}

fn check_object(
    schema: &Map<String, Value>,
    map: &Map<String, Value>,
    path: &str,
    errors: &mut ValidationErrors,
) {
    let properties = schema.get("properties").and_then(Value::as_object);

    if let Some(Value::Array(required)) = schema.get("required") {
        for name in required.iter().filter_map(Value::as_str) {
            if map.get(name).is_none_or(Value::is_null) {
                errors.push(join(path, name), "is required");
            }
        }
    }

    if let Some(properties) = properties {
        for (name, property_schema) in properties {
            if let Some(value) = map.get(name) {
                check(property_schema, value, &join(path, name), errors);
            }
        }
    }

    if schema.get("additionalProperties") == Some(&Value::Bool(false)) {
        for name in map.keys() {
            if properties.is_none_or(|known| !known.contains_key(name)) {
                errors.push(join(path, name), "is not a recognized parameter");
            }
        }
    }
}

fn check_range(schema: &Map<String, Value>, value: f64, path: &str, errors: &mut ValidationErrors) {
    if let Some(min) = schema.get("minimum").and_then(Value::as_f64)
        && value < min
    {
        errors.push(display_path(path), format!("must be at least {min}"));
    }
    if let Some(max) = schema.get("maximum").and_then(Value::as_f64)
        && value > max
    {
        errors.push(display_path(path), format!("must be at most {max}"));
    }
}

fn type_matches(expected: &Value, value: &Value) -> bool {
    match expected {
        Value::String(name) => single_type_matches(name, value),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .any(|name| single_type_matches(name, value)),
        _ => true,
    }
}

fn single_type_matches(name: &str, value: &Value) -> bool {
    match name {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        _ => true,
    }
}

fn describe_type(expected: &Value) -> String {
    match expected {
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" or "),
        other => other.as_str().unwrap_or("value").to_string(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "arguments".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string"},
                "provider": {"type": "string", "enum": ["atlassian", "kubernetes", "datadog"]},
                "methods": {"type": "array", "items": {"type": "string", "enum": ["GET", "POST"]}},
                "limit": {"type": ["integer", "null"], "minimum": 1, "maximum": 50}
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    #[test]
    fn accepts_valid_arguments() {
        let args = json!({"query": "issue", "provider": "atlassian", "methods": ["GET"], "limit": null});
        assert!(validate_arguments(&search_schema(), &args).is_ok());
    }

    #[test]
    fn reports_missing_required() {
        let errors = validate_arguments(&search_schema(), &json!({})).unwrap_err();
        assert_eq!(errors.fields(), [crate::FieldError::new("query", "is required")]);
    }

    #[test]
    fn null_does_not_satisfy_required() {
        let errors = validate_arguments(&search_schema(), &json!({"query": null})).unwrap_err();
        assert_eq!(errors.fields()[0].reason, "is required");
    }

    #[test]
    fn reports_every_violation_with_paths() {
        let args = json!({
            "query": 7,
            "provider": "github",
            "methods": ["GET", "FETCH"],
            "limit": 0,
            "verbose": true
        });
        let errors = validate_arguments(&search_schema(), &args).unwrap_err();
        let fields: Vec<&str> = errors.fields().iter().map(|e| e.field.as_str()).collect();

        assert_eq!(fields, ["query", "provider", "methods[1]", "limit", "verbose"]);
        assert_eq!(errors.fields()[0].reason, "expected string, got integer");
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let errors = validate_arguments(&search_schema(), &json!("issue")).unwrap_err();
        assert_eq!(errors.fields()[0].field, "arguments");
        assert_eq!(errors.fields()[0].reason, "expected object, got string");
    }

    #[test]
    fn float_is_not_an_integer() {
        let errors =
            validate_arguments(&search_schema(), &json!({"query": "x", "limit": 2.5})).unwrap_err();
        assert_eq!(errors.fields()[0].reason, "expected integer or null, got number");
    }
}
