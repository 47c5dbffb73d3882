//! Configuration property bags and `${name}` interpolation.

use std::collections::HashMap;
use std::sync::Arc;

/// Anything that can resolve a variable name to text.
pub trait Variables {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Replace every `${name}` in `expr` with its value from `vars`.
///
/// Unknown names resolve to the empty string. An unterminated `${` is kept
/// as written.
pub fn transform(expr: &str, vars: &dyn Variables) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut rest = expr;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = after[..end].trim();
                if let Some(value) = vars.lookup(name) {
                    out.push_str(&value);
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// A string property bag with an optional parent for fallback lookups.
#[derive(Clone, Debug, Default)]
pub struct Properties {
    values: HashMap<String, String>,
    parent: Option<Arc<Properties>>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: Arc<Properties>) -> Self {
        Self {
            values: HashMap::new(),
            parent: Some(parent),
        }
    }

    /// Build from JSON object entries. Non-string scalars keep their JSON
    /// text; nulls are skipped.
    pub fn from_json_object<'a>(
        entries: impl IntoIterator<Item = (&'a String, &'a serde_json::Value)>,
    ) -> Self {
        let mut props = Self::new();
        for (name, value) in entries {
            match value {
                serde_json::Value::Null => {}
                serde_json::Value::String(s) => props.set(name, s.clone()),
                other => props.set(name, other.to_string()),
            }
        }
        props
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(v) => Some(v.as_str()),
            None => self.parent.as_ref().and_then(|p| p.get(name)),
        }
    }

    /// The value exactly as configured.
    pub fn get_raw(&self, name: &str, dft: &str) -> String {
        self.get(name).unwrap_or(dft).to_string()
    }

    /// The value with `${name}` references resolved against this bag.
    pub fn get_string(&self, name: &str, dft: &str) -> String {
        match self.get(name) {
            Some(raw) => transform(raw, self),
            None => dft.to_string(),
        }
    }
}

impl Variables for Properties {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }
}

impl Variables for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn transform_replaces_references() {
        let v = vars(&[("name", "42"), ("kind", "user")]);
        assert_eq!(transform("${name}", &v), "42");
        assert_eq!(transform("${kind}:${name}!", &v), "user:42!");
        assert_eq!(transform("plain", &v), "plain");
    }

    #[test]
    fn transform_unknown_is_empty() {
        let v = vars(&[]);
        assert_eq!(transform("${missing}", &v), "");
        assert_eq!(transform("a${missing}b", &v), "ab");
    }

    #[test]
    fn transform_keeps_unterminated_reference() {
        let v = vars(&[("x", "1")]);
        assert_eq!(transform("${x}${y", &v), "1${y");
    }

    #[test]
    fn get_string_interpolates_within_bag_and_parent() {
        let mut parent = Properties::new();
        parent.set("prefix", "$cache");
        let mut props = Properties::with_parent(Arc::new(parent));
        props.set("pid", "${prefix}-users");
        props.set("id", "${prefix}");

        assert_eq!(props.get_string("pid", "$cache"), "$cache-users");
        assert_eq!(props.get_raw("id", ""), "${prefix}");
        assert_eq!(props.get_string("cid", "$cache-object"), "$cache-object");
    }

    #[test]
    fn json_scalars_are_stringified() {
        let json = serde_json::json!({"n": 3, "flag": true, "s": "x", "nothing": null});
        let props = Properties::from_json_object(json.as_object().unwrap().iter());
        assert_eq!(props.get("n"), Some("3"));
        assert_eq!(props.get("flag"), Some("true"));
        assert_eq!(props.get("s"), Some("x"));
        assert_eq!(props.get("nothing"), None);
    }
}
