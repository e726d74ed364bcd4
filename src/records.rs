//! Field maps built from JSON records.

use crate::dsl::Value;
use serde_json::Map;
use std::collections::HashMap;

/// Convert a JSON object into a field map.
///
/// Strings, numbers and booleans (as `"true"`/`"false"`) become fields. Null,
/// arrays and nested objects are left out, so relations on them never match.
pub fn build_field_map(object: &Map<String, serde_json::Value>) -> HashMap<String, Value> {
    object
        .iter()
        .filter_map(|(key, value)| json_to_value(value).map(|v| (key.clone(), v)))
        .collect()
}

fn json_to_value(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::String(s) => Some(Value::String(s.clone())),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Value::Integer(i)),
            None => n.as_f64().map(Value::Float),
        },
        serde_json::Value::Bool(b) => Some(Value::String(b.to_string())),
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            None
        }
    }
}

/// Parse one JSON Lines record into a field map; `None` unless it is an object.
pub fn parse_record(line: &str) -> Option<HashMap<String, Value>> {
    match serde_json::from_str::<serde_json::Value>(line) {
        Ok(serde_json::Value::Object(object)) => Some(build_field_map(&object)),
        _ => None,
    }
}
