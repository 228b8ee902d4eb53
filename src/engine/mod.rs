//! engine
//!
//! Orchestrates a check step: Resolve -> Traverse -> Check -> Map -> Fold.
//!
//! # Architecture
//!
//! 1. **Resolve**: read per-type directives from configuration
//! 2. **Traverse**: walk each master's tree to find its detail nodes
//! 3. **Check**: submit each detail's content to the classifier
//! 4. **Map**: evaluate mapping rules and write properties back
//! 5. **Fold**: AND every detail's validity into the step outcome
//!
//! # Error Policy
//!
//! - Missing directives fall back to defaults; they are not errors
//! - Structural absence (no node, empty container, no content) is an
//!   invalid result, not an error
//! - A failing mapping rule is logged and skipped
//! - Content, classifier and store-consistency failures abort the step
//!
//! # Example
//!
//! ```ignore
//! use fraudcheck::engine::{CheckStep, Runtime};
//!
//! let runtime = Runtime::new(content, classifier);
//! let step = CheckStep::new(&runtime, &store, settings.bpmn_error.clone());
//! let outcome = step.execute(&roots).await?;
//! ```

pub mod directives;
pub mod orchestrator;
pub mod runtime;
pub mod step;

pub use orchestrator::TreeOrchestrator;
pub use runtime::Runtime;
pub use step::{CheckStep, StepOutcome};

use thiserror::Error;

use crate::classifier::ClassifierError;
use crate::content::ContentError;
use crate::core::config::ConfigError;

/// Errors that abort a check step.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("content service failed: {0}")]
    Content(#[from] ContentError),

    #[error("classification failed: {0}")]
    Classifier(#[from] ClassifierError),
}
