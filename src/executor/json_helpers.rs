//! # JSON Conversion Helpers
//!
//! Conversions between JSON documents and the executor's bound [`Value`]s.
//!
//! ## Key Functions
//! - [`json_to_value`]: convert a `serde_json::Value` to a `Value`
//! - [`value_to_json`]: convert a `Value` into a JSON document fragment

use crate::graph::Value;

/// Convert serde_json::Value to Value.
///
/// # Mapping
/// - Null → None
/// - Bool → Boolean
/// - Number (i64) → Integer
/// - Number (f64) → Float
/// - String → String
/// - Array → Array (recursive conversion)
/// - Object → String (JSON serialized)
pub fn json_to_value(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::None,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::None
            }
        }
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(arr) => Value::Array(arr.iter().map(json_to_value).collect()),
        serde_json::Value::Object(obj) => Value::String(serde_json::Value::Object(obj.clone()).to_string()),
    }
}

/// Convert Value to serde_json::Value.
///
/// # Mapping
/// - None → Null
/// - Boolean → Bool
/// - Integer / Float → Number
/// - String → String
/// - Array → Array (recursive conversion)
/// - Object → Object with `id` plus every field
/// - Store → Null
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::None | Value::Store(_) => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Integer(i) => serde_json::json!(*i),
        Value::Float(f) => serde_json::json!(*f),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Array(arr) => serde_json::Value::Array(arr.iter().map(value_to_json).collect()),
        Value::Object(obj) => {
            let mut map = serde_json::Map::new();
            for (name, field) in obj.fields() {
                map.insert(name.clone(), serde_json::Value::String(field.clone()));
            }
            map.insert("id".to_string(), serde_json::Value::String(obj.id().to_string()));
            serde_json::Value::Object(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CacheObject;
    use std::sync::Arc;

    #[test]
    fn cache_object_becomes_json_object() {
        let obj = Arc::new(CacheObject::new("7").with_field("name", "bob"));
        let json = value_to_json(&Value::Object(obj));
        assert_eq!(json, serde_json::json!({"id": "7", "name": "bob"}));
    }

    #[test]
    fn json_numbers_keep_integer_kind() {
        assert!(matches!(json_to_value(&serde_json::json!(3)), Value::Integer(3)));
        assert!(matches!(json_to_value(&serde_json::json!(null)), Value::None));
    }
}
