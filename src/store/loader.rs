//! Materialization sources for stores.

use super::CacheObject;
use anyhow::{Context, bail};
use std::path::PathBuf;

/// Produces the value for a key a store does not hold yet.
///
/// `Ok(None)` means the key does not exist in the backing source.
pub trait Loader<T>: Send + Sync {
    fn load(&self, key: &str) -> anyhow::Result<Option<T>>;
}

/// A loader for lookup-only stores.
pub struct NoLoader;

impl<T> Loader<T> for NoLoader {
    fn load(&self, _key: &str) -> anyhow::Result<Option<T>> {
        Ok(None)
    }
}

/// Wraps a closure as a loader.
pub struct FnLoader<F>(pub F);

impl<T, F> Loader<T> for FnLoader<F>
where
    F: Fn(&str) -> anyhow::Result<Option<T>> + Send + Sync,
{
    fn load(&self, key: &str) -> anyhow::Result<Option<T>> {
        (self.0)(key)
    }
}

/// Reads `<dir>/<key>.json` into a [`CacheObject`].
///
/// The file holds a flat JSON object; non-string values are stored in their
/// JSON text form.
pub struct DirectoryLoader {
    dir: PathBuf,
}

impl DirectoryLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Loader<CacheObject> for DirectoryLoader {
    fn load(&self, key: &str) -> anyhow::Result<Option<CacheObject>> {
        if key.contains(['/', '\\']) || key.starts_with('.') {
            bail!("invalid cache key {:?}", key);
        }
        let path = self.dir.join(format!("{}.json", key));
        if !path.exists() {
            return Ok(None);
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let json: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        let serde_json::Value::Object(map) = json else {
            bail!("{} is not a JSON object", path.display());
        };

        let mut object = CacheObject::new(key);
        for (name, value) in map {
            let text = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            object = object.with_field(&name, text);
        }
        Ok(Some(object))
    }
}
