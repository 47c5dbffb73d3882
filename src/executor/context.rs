//! Execution context for bindings during script execution.

use super::error::ExecuteError;
use super::json_helpers::json_to_value;
use super::type_conversions::to_string;
use crate::graph::{FromValue, Value};
use crate::properties::{self, Variables};
use crate::store::CacheStore;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use uuid::Uuid;

/// One script run's shared resources. Stores registered here are visible to
/// every invocation of the session.
pub struct Session {
    id: Uuid,
    started: DateTime<Local>,
    stores: HashMap<String, Arc<CacheStore>>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started: Local::now(),
            stores: HashMap::new(),
        }
    }

    pub fn with_store(mut self, store: Arc<CacheStore>) -> Self {
        self.register(store);
        self
    }

    /// Register a store under its own id, replacing any previous one.
    pub fn register(&mut self, store: Arc<CacheStore>) {
        self.stores.insert(store.id().to_string(), store);
    }

    pub fn store(&self, id: &str) -> Option<Arc<CacheStore>> {
        self.stores.get(id).cloned()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started(&self) -> DateTime<Local> {
        self.started
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Stores the bindings of one tree evaluation.
///
/// A context is never shared between concurrently executing trees; nodes get
/// it by `&mut` and must undo every binding they push.
pub struct ExecutionContext {
    session: Arc<Session>,
    bindings: HashMap<String, Value>,
}

impl ExecutionContext {
    /// Creates a new empty execution context.
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            bindings: HashMap::new(),
        }
    }

    /// Creates a context with every entry of `params` bound by name.
    pub fn with_params(session: Arc<Session>, params: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut ctx = Self::new(session);
        for (name, value) in params {
            ctx.set_binding(name, json_to_value(value));
        }
        ctx
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn get_binding(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Typed lookup; `None` when absent or of another kind.
    pub fn get<T: FromValue>(&self, name: &str) -> Option<T> {
        self.bindings.get(name).and_then(T::from_value)
    }

    pub fn set_binding(&mut self, name: &str, value: impl Into<Value>) {
        self.bindings.insert(name.to_string(), value.into());
    }

    pub fn remove_binding(&mut self, name: &str) -> Option<Value> {
        self.bindings.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// The store bound under `name`.
    pub fn store(&self, name: &str) -> Result<Arc<CacheStore>, ExecuteError> {
        self.get::<Arc<CacheStore>>(name)
            .ok_or_else(|| ExecuteError::MissingCacheContext {
                name: name.to_string(),
            })
    }

    /// Resolve `${name}` references against the current bindings.
    pub fn transform(&self, expr: &str) -> String {
        properties::transform(expr, self)
    }

    /// Bind `name` until the returned guard is dropped.
    ///
    /// The guard removes the binding on every exit path, including unwinding,
    /// and derefs to the context so children run through it.
    pub fn bind_scoped(&mut self, name: &str, value: impl Into<Value>) -> BindingGuard<'_> {
        self.set_binding(name, value);
        BindingGuard {
            ctx: self,
            name: name.to_string(),
        }
    }
}

impl Variables for ExecutionContext {
    fn lookup(&self, name: &str) -> Option<String> {
        self.bindings.get(name).map(to_string)
    }
}

/// Removes its binding when dropped.
pub struct BindingGuard<'a> {
    ctx: &'a mut ExecutionContext,
    name: String,
}

impl Deref for BindingGuard<'_> {
    type Target = ExecutionContext;

    fn deref(&self) -> &ExecutionContext {
        &*self.ctx
    }
}

impl DerefMut for BindingGuard<'_> {
    fn deref_mut(&mut self) -> &mut ExecutionContext {
        &mut *self.ctx
    }
}

impl Drop for BindingGuard<'_> {
    fn drop(&mut self) {
        self.ctx.remove_binding(&self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CacheObject, InMemoryStore};

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(Arc::new(Session::new()))
    }

    #[test]
    fn set_overwrites_and_remove_unknown_is_noop() {
        let mut ctx = ctx();
        ctx.set_binding("a", "1");
        ctx.set_binding("a", "2");
        assert_eq!(ctx.get::<String>("a").as_deref(), Some("2"));
        assert!(ctx.remove_binding("never").is_none());
        assert!(ctx.contains("a"));
    }

    #[test]
    fn transform_uses_bindings() {
        let mut ctx = ctx();
        ctx.set_binding("name", "42");
        ctx.set_binding("n", 7i64);
        assert_eq!(ctx.transform("${name}"), "42");
        assert_eq!(ctx.transform("${n}-${absent}"), "7-");
    }

    #[test]
    fn scoped_binding_is_removed_on_drop() {
        let mut ctx = ctx();
        {
            let mut scope = ctx.bind_scoped("$bound", "x");
            assert!(scope.contains("$bound"));
            scope.set_binding("inner", "y");
        }
        assert!(!ctx.contains("$bound"));
        assert!(ctx.contains("inner"));
    }

    #[test]
    fn scoped_binding_is_removed_on_unwind() {
        let mut ctx = ctx();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _scope = ctx.bind_scoped("$bound", "x");
            panic!("child blew up");
        }));
        assert!(result.is_err());
        assert!(!ctx.contains("$bound"));
    }

    #[test]
    fn store_lookup_is_typed() {
        let mut ctx = ctx();
        assert_eq!(
            ctx.store("$cache").err(),
            Some(ExecuteError::MissingCacheContext { name: "$cache".into() })
        );

        ctx.set_binding("$cache", "not a store");
        assert!(ctx.store("$cache").is_err());

        let store: Arc<CacheStore> = Arc::new(InMemoryStore::<CacheObject>::new("users"));
        ctx.set_binding("$cache", store);
        assert_eq!(ctx.store("$cache").unwrap().id(), "users");
    }

    #[test]
    fn params_are_bound() {
        let params = serde_json::json!({"name": "42", "n": 3});
        let ctx = ExecutionContext::with_params(Arc::new(Session::new()), params.as_object().unwrap());
        assert_eq!(ctx.transform("${name}/${n}"), "42/3");
    }
}
