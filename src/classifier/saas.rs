//! classifier::saas
//!
//! HTTP client for the hosted fraud detection service.
//!
//! # Wire Format
//!
//! Request: multipart `POST <endpoint>/checkdocument/<algorithm>` with the
//! `Ocp-Apim-Subscription-Key` header and two parts:
//! - `Parameters`: `{"metadata":{"IMAGE_RECTO":"image1<ext>"}}` as
//!   `application/json`
//! - `image1<ext>`: the raw bytes, content type `image/<ext>`, carrying the
//!   original file name
//!
//! `<ext>` is the last three characters of the file name, without a dot.
//!
//! Response:
//!
//! ```json
//! {"result": true, "status": "Success",
//!  "details": {"mrz": {"status": "Failed", "description": "..."}}}
//! ```
//!
//! Status texts and detail names are upper-cased.
//!
//! # Example
//!
//! ```ignore
//! use fraudcheck::classifier::{Classifier, SaasClassifier};
//!
//! let classifier = SaasClassifier::new(&settings);
//! let result = classifier.check("RIB", &part).await?;
//! ```

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::traits::{Classifier, ClassifierError};
use crate::core::config::ServiceSettings;
use crate::core::types::{CheckResult, ContentPart, DetailOutcome};

/// Header carrying the subscription key.
pub const SUBSCRIPTION_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Status text meaning success.
const SUCCESS: &str = "SUCCESS";

/// Classifier backed by the hosted service.
pub struct SaasClassifier {
    client: Client,
    subscription_key: String,
    endpoint: String,
}

// Custom Debug to avoid exposing the subscription key
impl std::fmt::Debug for SaasClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaasClassifier")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl SaasClassifier {
    /// Create a classifier from service settings.
    pub fn new(settings: &ServiceSettings) -> Self {
        Self::with_endpoint(&settings.subscription_key, &settings.endpoint)
    }

    /// Create a classifier for an explicit endpoint.
    pub fn with_endpoint(subscription_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            subscription_key: subscription_key.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    /// Service endpoint base URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// URL checked for a given algorithm.
    pub fn check_url(&self, algorithm: &str) -> String {
        format!("{}/checkdocument/{}", self.endpoint, algorithm)
    }
}

#[async_trait]
impl Classifier for SaasClassifier {
    fn name(&self) -> &'static str {
        "saas"
    }

    async fn check(
        &self,
        algorithm: &str,
        part: &ContentPart,
    ) -> Result<CheckResult, ClassifierError> {
        let extension = file_extension(&part.name);
        let part_name = file_part_name(extension);
        let parameters = parameters(&part_name);
        let url = self.check_url(algorithm);

        let form = Form::new()
            .part(
                "Parameters",
                Part::text(parameters.to_string())
                    .mime_str("application/json")
                    .map_err(|e| ClassifierError::InvalidRequest(e.to_string()))?,
            )
            .part(
                part_name.clone(),
                Part::bytes(part.content.clone())
                    .file_name(part.name.clone())
                    .mime_str(&format!("image/{}", extension))
                    .map_err(|e| ClassifierError::InvalidRequest(e.to_string()))?,
            );

        let response = self
            .client
            .post(&url)
            .header(SUBSCRIPTION_HEADER, &self.subscription_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        debug!(%url, %parameters, %status, %body, "classification call completed");

        if !status.is_success() {
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        parse_response(&body)
    }
}

/// Last three characters of a file name (the whole name if shorter).
pub fn file_extension(filename: &str) -> &str {
    match filename.char_indices().rev().nth(2) {
        Some((start, _)) => &filename[start..],
        None => filename,
    }
}

/// Name of the multipart part carrying the document.
pub fn file_part_name(extension: &str) -> String {
    format!("image1{}", extension)
}

/// Body of the `Parameters` part.
pub fn parameters(file_part_name: &str) -> Value {
    json!({ "metadata": { "IMAGE_RECTO": file_part_name } })
}

/// Shape a response body into a [`CheckResult`].
///
/// # Errors
///
/// Returns `ClassifierError::InvalidResponse` if the body is not JSON or a
/// required field is missing or mistyped.
pub fn parse_response(body: &str) -> Result<CheckResult, ClassifierError> {
    let response: Value = serde_json::from_str(body)
        .map_err(|e| ClassifierError::InvalidResponse(format!("body is not JSON: {}", e)))?;

    let valid = response
        .get("result")
        .and_then(Value::as_bool)
        .ok_or_else(|| invalid("missing boolean 'result'"))?;
    let status_text = required_str(&response, "status")?.to_uppercase();

    let details = match response.get("details") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Object(entries)) => parse_details(entries)?,
        Some(_) => return Err(invalid("'details' is not an object")),
    };

    Ok(CheckResult {
        valid,
        success: status_text == SUCCESS,
        status_text,
        details,
    })
}

fn parse_details(entries: &Map<String, Value>) -> Result<Vec<DetailOutcome>, ClassifierError> {
    entries
        .iter()
        .map(|(name, detail)| {
            let status_text = required_str(detail, "status")?.to_uppercase();
            Ok(DetailOutcome {
                name: name.to_uppercase(),
                success: status_text == SUCCESS,
                status_text,
                description: required_str(detail, "description")?.to_string(),
            })
        })
        .collect()
}

fn required_str<'v>(value: &'v Value, field: &str) -> Result<&'v str, ClassifierError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(&format!("missing string '{}'", field)))
}

fn invalid(message: &str) -> ClassifierError {
    ClassifierError::InvalidResponse(message.to_string())
}
