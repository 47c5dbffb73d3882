use crate::store::{CacheObject, CacheStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Serialized form of one script node and its children.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeDef {
    pub tag: String,
    #[serde(default)]
    pub props: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub children: Vec<NodeDef>,
}

impl NodeDef {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_prop(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.props.insert(name.to_string(), value.into());
        self
    }

    pub fn with_child(mut self, child: NodeDef) -> Self {
        self.children.push(child);
        self
    }
}

/// A value bound in an execution context.
#[derive(Clone)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(Arc<CacheObject>),
    Store(Arc<CacheStore>),
    None,
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "Boolean({})", b),
            Value::Integer(i) => write!(f, "Integer({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Array(arr) => f.debug_tuple("Array").field(arr).finish(),
            Value::Object(obj) => write!(f, "Object({:?})", obj.id()),
            Value::Store(store) => write!(f, "Store({:?})", store.id()),
            Value::None => write!(f, "None"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Arc<CacheObject>> for Value {
    fn from(obj: Arc<CacheObject>) -> Self {
        Value::Object(obj)
    }
}

impl From<Arc<CacheStore>> for Value {
    fn from(store: Arc<CacheStore>) -> Self {
        Value::Store(store)
    }
}

/// Typed extraction of a bound value.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Arc<CacheStore> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Store(store) => Some(store.clone()),
            _ => None,
        }
    }
}

impl FromValue for Arc<CacheObject> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(obj) => Some(obj.clone()),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}
