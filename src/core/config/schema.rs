//! core::config::schema
//!
//! Service-level settings read from the configuration store.
//!
//! # Keys
//!
//! ```toml
//! subscriptionKey = "..."          # required
//! bpmnError = "FRAUD_DETECTED"     # optional, empty means unset
//! endpoint = "https://..."         # optional
//! ```
//!
//! Per-type directives (`master.*`, `detail.*`, `mapping.*`) are not part of
//! this schema; they are resolved on demand by the orchestrator.

use super::{ConfigError, ConfigStore};

/// Default base URL of the classification service.
pub const DEFAULT_ENDPOINT: &str = "https://itesoftfrauddev.azure-api.net";

pub const SUBSCRIPTION_KEY: &str = "subscriptionKey";
pub const BPMN_ERROR_KEY: &str = "bpmnError";
pub const ENDPOINT_KEY: &str = "endpoint";

/// Settings shared by every check of a step.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Classification service subscription key
    pub subscription_key: String,
    /// Error code raised when the step fails, if any
    pub bpmn_error: Option<String>,
    /// Classification service base URL
    pub endpoint: String,
}

// Custom Debug to avoid exposing the subscription key
impl std::fmt::Debug for ServiceSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSettings")
            .field("subscription_key", &"<redacted>")
            .field("bpmn_error", &self.bpmn_error)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl ServiceSettings {
    /// Read settings from a store.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `subscriptionKey` is not set.
    pub fn from_store(store: &dyn ConfigStore) -> Result<Self, ConfigError> {
        let subscription_key = store
            .value(SUBSCRIPTION_KEY)
            .map_err(|_| ConfigError::Missing(SUBSCRIPTION_KEY.to_string()))?;

        let bpmn_error = store.value(BPMN_ERROR_KEY).ok().filter(|e| !e.is_empty());

        let endpoint = store
            .value(ENDPOINT_KEY)
            .ok()
            .filter(|e| !e.is_empty())
            .map(|e| e.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        Ok(Self {
            subscription_key,
            bpmn_error,
            endpoint,
        })
    }
}
