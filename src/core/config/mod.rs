//! core::config
//!
//! Flat, prefix-namespaced configuration and its resolution.
//!
//! # Overview
//!
//! Configuration is a flat string-keyed store. Directives are looked up
//! through lists of candidate keys composed by [`crate::core::keys`],
//! ordered from most to least specific:
//!
//! - [`ConfigResolver::resolve_one`] returns the first candidate that is
//!   present, or a fallback.
//! - [`ConfigResolver::resolve_bundle`] gathers every key under a set of
//!   candidate prefixes. For each suffix, the earliest prefix wins, no
//!   matter in which order the store enumerates its keys.
//!
//! # Config File Locations
//!
//! Searched in order by [`locate_config_file`]:
//! 1. An explicit path (`--config`)
//! 2. `$FRAUDCHECK_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/fraudcheck/fraud.toml`
//! 4. `~/.fraudcheck/fraud.toml`
//!
//! # Example
//!
//! ```
//! use fraudcheck::core::config::{ConfigResolver, MapConfigStore};
//!
//! let store = MapConfigStore::from_pairs([
//!     ("detail.INVOICE.algorithm", "RIB"),
//!     ("mapping.detail.*.checked", "true"),
//!     ("mapping.detail.INVOICE.checked", "result.valid"),
//! ]);
//! let resolver = ConfigResolver::new(&store);
//!
//! let algorithm = resolver
//!     .resolve_one(
//!         &["detail.SCAN.algorithm".to_string(), "detail.INVOICE.algorithm".to_string()],
//!         Some("ALL"),
//!     )
//!     .unwrap();
//! assert_eq!(algorithm.as_deref(), Some("RIB"));
//!
//! let bundle = resolver
//!     .resolve_bundle(&["mapping.detail.INVOICE.".to_string(), "mapping.detail.*.".to_string()])
//!     .unwrap();
//! assert_eq!(bundle["checked"], "result.valid");
//! ```

pub mod schema;
mod store;

pub use schema::ServiceSettings;
pub use store::MapConfigStore;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "FRAUDCHECK_CONFIG";

/// File name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "fraud.toml";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The key has no value. Resolution treats this as absence.
    #[error("configuration key not found: {0}")]
    KeyNotFound(String),

    /// A key listed by the store could not be read back.
    #[error("configuration store is inconsistent: listed key '{key}' cannot be read")]
    Inconsistent { key: String },

    /// A required setting is missing.
    #[error("missing required configuration key '{0}'")]
    Missing(String),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("no configuration file found (set {CONFIG_ENV_VAR} or pass --config)")]
    NoConfigFile,
}

/// A read-only key/value configuration source.
///
/// Implementations guarantee that every key returned by [`keys`] can be
/// read with [`value`].
///
/// [`keys`]: ConfigStore::keys
/// [`value`]: ConfigStore::value
pub trait ConfigStore: Send + Sync {
    /// All keys, in the store's enumeration order.
    fn keys(&self) -> Vec<String>;

    /// Get the value of a key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::KeyNotFound` if the key has no value. A present
    /// but empty value is `Ok("")`.
    fn value(&self, key: &str) -> Result<String, ConfigError>;
}

/// First-match-wins lookups over a [`ConfigStore`].
#[derive(Clone, Copy)]
pub struct ConfigResolver<'a> {
    store: &'a dyn ConfigStore,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(store: &'a dyn ConfigStore) -> Self {
        Self { store }
    }

    /// Return the value of the first candidate key present in the store.
    ///
    /// Falls back to `fallback` (which may itself be `None`) when no
    /// candidate is present.
    ///
    /// # Errors
    ///
    /// Only `ConfigError::KeyNotFound` counts as absence; any other store
    /// failure is returned.
    pub fn resolve_one(
        &self,
        candidates: &[String],
        fallback: Option<&str>,
    ) -> Result<Option<String>, ConfigError> {
        for key in candidates {
            match self.store.value(key) {
                Ok(value) => return Ok(Some(value)),
                Err(ConfigError::KeyNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(fallback.map(str::to_string))
    }

    /// Collect all values whose key starts with one of `prefixes`, keyed by
    /// the remaining suffix.
    ///
    /// Each store key is matched against the first prefix it starts with.
    /// A suffix claimed through an earlier prefix is never overwritten by a
    /// later one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Inconsistent` if a listed key cannot be read.
    pub fn resolve_bundle(
        &self,
        prefixes: &[String],
    ) -> Result<BTreeMap<String, String>, ConfigError> {
        let keys = self.store.keys();
        // (prefix rank, value) per suffix; a lower rank wins.
        let mut claimed: BTreeMap<String, (usize, String)> = BTreeMap::new();

        for key in &keys {
            let Some((rank, prefix)) = prefixes
                .iter()
                .enumerate()
                .find(|(_, prefix)| key.starts_with(prefix.as_str()))
            else {
                continue;
            };

            let suffix = &key[prefix.len()..];
            if matches!(claimed.get(suffix), Some((held, _)) if *held <= rank) {
                continue;
            }

            let value = self.store.value(key).map_err(|_| ConfigError::Inconsistent {
                key: key.clone(),
            })?;
            claimed.insert(suffix.to_string(), (rank, value));
        }

        let bundle: BTreeMap<String, String> =
            claimed.into_iter().map(|(k, (_, v))| (k, v)).collect();
        debug!(?prefixes, ?bundle, "resolved configuration bundle");
        Ok(bundle)
    }
}

/// Find the configuration file to load.
///
/// # Errors
///
/// Returns `ConfigError::NoConfigFile` if no candidate exists.
pub fn locate_config_file(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
    }

    if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_home).join("fraudcheck").join(CONFIG_FILE_NAME);
        if path.exists() {
            return Ok(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let path = home.join(".fraudcheck").join(CONFIG_FILE_NAME);
        if path.exists() {
            return Ok(path);
        }
    }

    Err(ConfigError::NoConfigFile)
}
