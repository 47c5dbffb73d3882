//! Type conversion utilities for the executor.
//!
//! Provides the text form of bound values used by interpolation.

use crate::graph::Value;

/// Convert a Value to the text substituted by `${name}`.
///
/// Cache objects render as their id and stores as nothing, since neither has
/// a meaningful literal form.
pub fn to_string(val: &Value) -> String {
    match val {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_string).collect();
            items.join(",")
        }
        Value::Object(obj) => obj.id().to_string(),
        Value::Store(_) | Value::None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CacheObject;
    use std::sync::Arc;

    #[test]
    fn text_forms() {
        assert_eq!(to_string(&Value::Integer(42)), "42");
        assert_eq!(to_string(&Value::None), "");
        assert_eq!(
            to_string(&Value::Array(vec![Value::from("a"), Value::Integer(1)])),
            "a,1"
        );
        assert_eq!(
            to_string(&Value::Object(Arc::new(CacheObject::new("u1")))),
            "u1"
        );
    }
}
