//! classifier::traits
//!
//! Classifier trait definition.
//!
//! # Design
//!
//! A classifier receives one document's content and returns a structured
//! [`CheckResult`]. The trait is async because the real classifier is a
//! remote service. Failures are never retried at this layer.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::{CheckResult, ContentPart};

/// Errors from classification calls.
#[derive(Debug, Clone, Error)]
pub enum ClassifierError {
    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success HTTP status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// The response body is not a valid check result.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A document classifier.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// check of a process.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classifier name for diagnostics (e.g., "saas", "mock").
    fn name(&self) -> &'static str;

    /// Submit one content part using the given check algorithm.
    ///
    /// # Errors
    ///
    /// Any transport or decoding failure. Callers treat it as fatal for the
    /// current master.
    async fn check(&self, algorithm: &str, part: &ContentPart)
        -> Result<CheckResult, ClassifierError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_error_display() {
        assert_eq!(
            ClassifierError::Network("connection refused".into()).to_string(),
            "network error: connection refused"
        );
        assert_eq!(
            ClassifierError::Api {
                status: 401,
                message: "Access denied".into()
            }
            .to_string(),
            "API error: 401 - Access denied"
        );
        assert_eq!(
            ClassifierError::InvalidResponse("missing 'result'".into()).to_string(),
            "invalid response: missing 'result'"
        );
    }
}
