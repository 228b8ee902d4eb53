//! classifier::mock
//!
//! Mock classifier for deterministic testing.
//!
//! # Example
//!
//! ```
//! use fraudcheck::classifier::mock::MockClassifier;
//! use fraudcheck::classifier::Classifier;
//! use fraudcheck::core::types::{CheckResult, ContentPart};
//!
//! # tokio_test::block_on(async {
//! let classifier = MockClassifier::new().with_result(CheckResult {
//!     valid: true,
//!     success: true,
//!     status_text: "SUCCESS".to_string(),
//!     details: vec![],
//! });
//!
//! let result = classifier
//!     .check("RIB", &ContentPart::new("scan.png", b"...".to_vec()))
//!     .await
//!     .unwrap();
//! assert!(result.valid);
//! assert_eq!(classifier.calls().len(), 1);
//! assert_eq!(classifier.calls()[0].algorithm, "RIB");
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{Classifier, ClassifierError};
use crate::core::types::{CheckResult, ContentPart};

/// Mock classifier for testing.
///
/// Returns a default result for every call unless a result was registered
/// for the submitted file name. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockClassifier {
    inner: Arc<Mutex<MockClassifierInner>>,
}

#[derive(Debug, Default)]
struct MockClassifierInner {
    default_result: CheckResult,
    by_filename: HashMap<String, CheckResult>,
    fail_with: Option<ClassifierError>,
    calls: Vec<CheckCall>,
}

/// Recorded classification call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckCall {
    pub algorithm: String,
    pub filename: String,
    pub size: usize,
}

impl MockClassifier {
    /// Create a mock returning an invalid result by default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the result returned for unregistered file names.
    pub fn with_result(self, result: CheckResult) -> Self {
        self.inner.lock().unwrap().default_result = result;
        self
    }

    /// Set the result returned for a specific file name.
    pub fn with_result_for(self, filename: impl Into<String>, result: CheckResult) -> Self {
        self.inner
            .lock()
            .unwrap()
            .by_filename
            .insert(filename.into(), result);
        self
    }

    /// Fail every call with the given error.
    pub fn fail_with(self, error: ClassifierError) -> Self {
        self.inner.lock().unwrap().fail_with = Some(error);
        self
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<CheckCall> {
        self.inner.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn check(
        &self,
        algorithm: &str,
        part: &ContentPart,
    ) -> Result<CheckResult, ClassifierError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(CheckCall {
            algorithm: algorithm.to_string(),
            filename: part.name.clone(),
            size: part.content.len(),
        });

        if let Some(e) = &inner.fail_with {
            return Err(e.clone());
        }

        Ok(inner
            .by_filename
            .get(&part.name)
            .cloned()
            .unwrap_or_else(|| inner.default_result.clone()))
    }
}
