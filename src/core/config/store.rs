//! core::config::store
//!
//! In-memory configuration store, optionally loaded from TOML.
//!
//! Nested tables are flattened by joining keys with `.`, so the following
//! are equivalent:
//!
//! ```toml
//! "detail.INVOICE.algorithm" = "RIB"
//!
//! [detail.INVOICE]
//! algorithm = "RIB"
//! ```
//!
//! Scalars are stored as their string form; arrays are joined with `,`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::{ConfigError, ConfigStore};

/// Insertion-ordered key/value store.
#[derive(Debug, Clone, Default)]
pub struct MapConfigStore {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl MapConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from key/value pairs, keeping their order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut store = Self::new();
        for (k, v) in pairs {
            store.insert(k, v);
        }
        store
    }

    /// Insert or replace a value. A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a TOML document into a flat store.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` on invalid TOML; `origin` is used
    /// in the error message.
    pub fn from_toml_str(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut store = Self::new();
        flatten_into(&mut store, "", &table);
        Ok(store)
    }

    /// Load a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&contents, path)
    }
}

impl ConfigStore for MapConfigStore {
    fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    fn value(&self, key: &str) -> Result<String, ConfigError> {
        self.index
            .get(key)
            .map(|&pos| self.entries[pos].1.clone())
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))
    }
}

fn flatten_into(store: &mut MapConfigStore, prefix: &str, table: &toml::Table) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(nested) => flatten_into(store, &full_key, nested),
            toml::Value::Array(items) => {
                let joined = items.iter().map(scalar_string).collect::<Vec<_>>().join(",");
                store.insert(full_key, joined);
            }
            other => store.insert(full_key, scalar_string(other)),
        }
    }
}

fn scalar_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
