//! Keyed object stores shared across a script session.
//!
//! A store answers `load(key, create_if_absent)` with either a complete
//! object or absence. Stores that can materialize missing entries do so
//! through a [`Loader`].

mod loader;
mod memory;

pub use loader::{DirectoryLoader, FnLoader, Loader, NoLoader};
pub use memory::InMemoryStore;

use std::collections::HashMap;
use std::sync::Arc;

/// Whether a store may materialize entries it does not hold yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    #[default]
    CreateIfAbsent,
    LookupOnly,
}

/// A keyed cache of `T`.
pub trait Store<T>: Send + Sync {
    /// Identity used to register the store in a session.
    fn id(&self) -> &str;

    fn policy(&self) -> LoadPolicy;

    /// Returns the entry for `key`, materializing it first when
    /// `create_if_absent` is set and the policy allows it. Absence is `None`,
    /// never an error.
    fn load(&self, key: &str, create_if_absent: bool) -> Option<Arc<T>>;
}

/// The store kind scripts bind under `$cache`.
pub type CacheStore = dyn Store<CacheObject>;

/// A cached record: an id plus string fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CacheObject {
    id: String,
    fields: HashMap<String, String>,
}

impl CacheObject {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }
}
