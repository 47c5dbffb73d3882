//! # Dictionary Loaders
//!
//! Pluggable sources of analyzer dictionaries. A loader is configured once
//! from a property bag (or a JSON element layered over one) and then answers
//! the [`DictionaryConfiguration`] queries.
//!
//! ## Loaders
//! - [`InlineDictionaryLoader`]: comma-separated words given in properties
//! - [`FileDictionaryLoader`]: word-per-line files named in properties

use crate::properties::Properties;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configured from a property bag.
pub trait Configurable {
    fn configure(&mut self, props: &Properties);
}

/// Configured from a JSON element whose attributes override `parent`.
pub trait JsonConfigurable {
    fn configure_json(&mut self, element: &serde_json::Value, parent: &Arc<Properties>);
}

/// The word lists an analyzer asks for.
pub trait DictionaryConfiguration {
    fn main_words(&self) -> Vec<String>;
    fn quantifier_words(&self) -> Vec<String>;
    fn ext_words(&self) -> Vec<String>;
    fn stop_words(&self) -> Vec<String>;
}

pub trait DictionaryLoader: Configurable + JsonConfigurable + DictionaryConfiguration + Send + Sync {}

impl<T> DictionaryLoader for T where T: Configurable + JsonConfigurable + DictionaryConfiguration + Send + Sync {}

/// Layer a JSON element's scalar attributes over `parent`.
fn element_properties(element: &serde_json::Value, parent: &Arc<Properties>) -> Properties {
    let mut props = Properties::with_parent(parent.clone());
    if let Some(attrs) = element.as_object() {
        for (name, value) in attrs {
            match value {
                serde_json::Value::String(s) => props.set(name, s.clone()),
                serde_json::Value::Null
                | serde_json::Value::Array(_)
                | serde_json::Value::Object(_) => {}
                other => props.set(name, other.to_string()),
            }
        }
    }
    props
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Words listed directly in the configuration: `main`, `quantifier`, `ext`
/// and `stop`, each comma-separated.
#[derive(Debug, Default, Clone)]
pub struct InlineDictionaryLoader {
    main: Vec<String>,
    quantifier: Vec<String>,
    ext: Vec<String>,
    stop: Vec<String>,
}

impl Configurable for InlineDictionaryLoader {
    fn configure(&mut self, props: &Properties) {
        self.main = split_list(&props.get_string("main", ""));
        self.quantifier = split_list(&props.get_string("quantifier", ""));
        self.ext = split_list(&props.get_string("ext", ""));
        self.stop = split_list(&props.get_string("stop", ""));
    }
}

impl JsonConfigurable for InlineDictionaryLoader {
    fn configure_json(&mut self, element: &serde_json::Value, parent: &Arc<Properties>) {
        let props = element_properties(element, parent);
        self.configure(&props);
    }
}

impl DictionaryConfiguration for InlineDictionaryLoader {
    fn main_words(&self) -> Vec<String> {
        self.main.clone()
    }

    fn quantifier_words(&self) -> Vec<String> {
        self.quantifier.clone()
    }

    fn ext_words(&self) -> Vec<String> {
        self.ext.clone()
    }

    fn stop_words(&self) -> Vec<String> {
        self.stop.clone()
    }
}

/// Words read from files. `home` is the base directory; `main`,
/// `quantifier`, `ext` and `stop` are comma-separated file names relative to
/// it. Files hold one word per line; blank lines and `#` comments are
/// skipped. Unreadable files are logged and contribute nothing.
#[derive(Debug, Default, Clone)]
pub struct FileDictionaryLoader {
    home: PathBuf,
    main: Vec<String>,
    quantifier: Vec<String>,
    ext: Vec<String>,
    stop: Vec<String>,
}

impl FileDictionaryLoader {
    fn read_all(&self, files: &[String]) -> Vec<String> {
        let mut words = Vec::new();
        for file in files {
            let path = self.home.join(file);
            match read_words(&path) {
                Ok(mut found) => words.append(&mut found),
                Err(e) => log::error!("Failed to load dictionary {}: {}", path.display(), e),
            }
        }
        words
    }
}

fn read_words(path: &Path) -> std::io::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

impl Configurable for FileDictionaryLoader {
    fn configure(&mut self, props: &Properties) {
        self.home = PathBuf::from(props.get_string("home", "."));
        self.main = split_list(&props.get_string("main", "main.dic"));
        self.quantifier = split_list(&props.get_string("quantifier", "quantifier.dic"));
        self.ext = split_list(&props.get_string("ext", ""));
        self.stop = split_list(&props.get_string("stop", ""));
    }
}

impl JsonConfigurable for FileDictionaryLoader {
    fn configure_json(&mut self, element: &serde_json::Value, parent: &Arc<Properties>) {
        let props = element_properties(element, parent);
        self.configure(&props);
    }
}

impl DictionaryConfiguration for FileDictionaryLoader {
    fn main_words(&self) -> Vec<String> {
        self.read_all(&self.main)
    }

    fn quantifier_words(&self) -> Vec<String> {
        self.read_all(&self.quantifier)
    }

    fn ext_words(&self) -> Vec<String> {
        self.read_all(&self.ext)
    }

    fn stop_words(&self) -> Vec<String> {
        self.read_all(&self.stop)
    }
}

/// Create and configure a loader by kind (`inline` or `file`).
pub fn load_dictionary(kind: &str, props: &Properties) -> Option<Box<dyn DictionaryLoader>> {
    let mut loader: Box<dyn DictionaryLoader> = match kind {
        "inline" => Box::new(InlineDictionaryLoader::default()),
        "file" => Box::new(FileDictionaryLoader::default()),
        other => {
            log::warn!("Unknown dictionary loader kind: {}", other);
            return None;
        }
    };
    loader.configure(props);
    Some(loader)
}
