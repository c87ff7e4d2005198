//! Null filtering for page-tree JSON.

use serde_json::Value;

/// Replace absent or placeholder values with an empty array, recursively.
///
/// `null`, `""`, `"null"`, `[]` and `{}` all become `[]`. Arrays and objects
/// are filtered element-wise; numbers and booleans pass through. Applying the
/// filter twice gives the same result as applying it once.
pub fn filter_null(value: Value) -> Value {
    match value {
        Value::Null => empty(),
        Value::String(s) if s.is_empty() || s == "null" => empty(),
        Value::Array(items) => Value::Array(items.into_iter().map(filter_null).collect()),
        Value::Object(map) if map.is_empty() => empty(),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, filter_null(value)))
                .collect(),
        ),
        other => other,
    }
}

/// Whether `value` is what [`filter_null`] produces for an absent value.
pub fn is_empty_marker(value: &Value) -> bool {
    matches!(value, Value::Array(items) if items.is_empty())
}

fn empty() -> Value {
    Value::Array(Vec::new())
}
