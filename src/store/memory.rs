use super::{LoadPolicy, Loader, NoLoader, Store};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Slot<T> = Arc<Mutex<Option<Arc<T>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An in-memory store with per-key materialization.
///
/// Each key owns a slot guarded by its own mutex, so concurrent loads of one
/// absent key run the loader once and share the result, while loads of other
/// keys proceed independently.
pub struct InMemoryStore<T> {
    id: String,
    policy: LoadPolicy,
    loader: Box<dyn Loader<T>>,
    slots: Mutex<HashMap<String, Slot<T>>>,
    materialized: AtomicUsize,
}

impl<T: Send + Sync + 'static> InMemoryStore<T> {
    /// A lookup-only store; entries come from [`InMemoryStore::insert`].
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_policy(id, LoadPolicy::LookupOnly, NoLoader)
    }

    /// A store that materializes absent keys through `loader`.
    pub fn with_loader(id: impl Into<String>, loader: impl Loader<T> + 'static) -> Self {
        Self::with_policy(id, LoadPolicy::CreateIfAbsent, loader)
    }

    pub fn with_policy(
        id: impl Into<String>,
        policy: LoadPolicy,
        loader: impl Loader<T> + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            policy,
            loader: Box::new(loader),
            slots: Mutex::new(HashMap::new()),
            materialized: AtomicUsize::new(0),
        }
    }

    /// Seed an entry, replacing any previous value.
    pub fn insert(&self, key: impl Into<String>, value: T) -> Arc<T> {
        let value = Arc::new(value);
        let slot = Arc::new(Mutex::new(Some(value.clone())));
        lock(&self.slots).insert(key.into(), slot);
        value
    }

    /// Drop a single entry. The next `load` with create materializes it again.
    ///
    /// Waits for an in-flight load of `key` to finish first, so a
    /// materialization is never duplicated while it is still running.
    pub fn expire(&self, key: &str) -> bool {
        let slot = lock(&self.slots).get(key).cloned();
        let Some(slot) = slot else {
            return false;
        };
        let entry = lock(&slot);
        let filled = entry.is_some();
        self.release(key, &slot);
        filled
    }

    pub fn clear(&self) {
        lock(&self.slots).clear();
    }

    /// Whether `key` holds a value. Blocks while that key is being loaded.
    pub fn contains(&self, key: &str) -> bool {
        let slot = lock(&self.slots).get(key).cloned();
        let Some(slot) = slot else {
            return false;
        };
        let filled = lock(&slot).is_some();
        filled
    }

    /// Number of filled entries. Blocks while any key is being loaded.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot<T>> = lock(&self.slots).values().cloned().collect();
        slots.iter().filter(|slot| lock(slot).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times the loader produced a value.
    pub fn materializations(&self) -> usize {
        self.materialized.load(Ordering::SeqCst)
    }

    fn slot(&self, key: String) -> Slot<T> {
        lock(&self.slots).entry(key).or_default().clone()
    }

    /// Whether `slot` is still the one mapped for `key`.
    fn is_current(&self, key: &str, slot: &Slot<T>) -> bool {
        lock(&self.slots)
            .get(key)
            .is_some_and(|mapped| Arc::ptr_eq(mapped, slot))
    }

    /// Unmap `slot` if it is still the one mapped for `key`.
    ///
    /// Callers hold the slot lock, so lock order is always slot then map.
    fn release(&self, key: &str, slot: &Slot<T>) {
        let mut slots = lock(&self.slots);
        if slots.get(key).is_some_and(|mapped| Arc::ptr_eq(mapped, slot)) {
            slots.remove(key);
        }
    }
}

impl<T: Send + Sync + 'static> Store<T> for InMemoryStore<T> {
    fn id(&self) -> &str {
        &self.id
    }

    fn policy(&self) -> LoadPolicy {
        self.policy
    }

    fn load(&self, key: &str, create_if_absent: bool) -> Option<Arc<T>> {
        let create = create_if_absent && self.policy == LoadPolicy::CreateIfAbsent;

        loop {
            let slot = if create {
                self.slot(key.to_string())
            } else {
                lock(&self.slots).get(key).cloned()?
            };

            // Holding the slot lock across the loader call serializes
            // materialization for this key only.
            let mut entry = lock(&slot);
            if let Some(found) = entry.as_ref() {
                return Some(found.clone());
            }
            if !create {
                return None;
            }
            // Expired or released while we waited; start over on a fresh slot.
            if !self.is_current(key, &slot) {
                continue;
            }

            match self.loader.load(key) {
                Ok(Some(value)) => {
                    let value = Arc::new(value);
                    *entry = Some(value.clone());
                    self.materialized.fetch_add(1, Ordering::SeqCst);
                    log::debug!("store {}: materialized {}", self.id, key);
                    return Some(value);
                }
                Ok(None) => {
                    log::debug!("store {}: no source entry for {}", self.id, key);
                }
                Err(e) => {
                    log::warn!("store {}: failed to load {}: {:#}", self.id, key, e);
                }
            }
            self.release(key, &slot);
            return None;
        }
    }
}
