//! engine::step
//!
//! The check step as seen by a workflow host.
//!
//! A step receives a set of root nodes, checks each of them as a master,
//! and reports one overall outcome. A failed check only fails the step when
//! an error code (`bpmnError`) is configured; otherwise the step completes
//! and reports `passed = false`.

use serde::Serialize;
use tracing::{debug, info};

use super::{EngineError, Runtime, TreeOrchestrator};
use crate::core::config::ConfigStore;
use crate::core::types::NodeId;

/// How the host should proceed after the step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum StepOutcome {
    /// Continue the workflow normally.
    Complete { passed: bool },
    /// Fail the workflow with the configured error code.
    Fail { error_code: String },
}

impl StepOutcome {
    /// Whether every checked detail was valid.
    pub fn passed(&self) -> bool {
        matches!(self, StepOutcome::Complete { passed: true })
    }
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepOutcome::Complete { passed: true } => write!(f, "complete (all documents valid)"),
            StepOutcome::Complete { passed: false } => {
                write!(f, "complete (some documents invalid)")
            }
            StepOutcome::Fail { error_code } => write!(f, "fail ({})", error_code),
        }
    }
}

/// One invocation of the check step.
pub struct CheckStep<'a> {
    runtime: &'a Runtime,
    store: &'a dyn ConfigStore,
    error_code: Option<String>,
}

impl<'a> CheckStep<'a> {
    /// Create a step. An empty `error_code` is treated as unset.
    pub fn new(
        runtime: &'a Runtime,
        store: &'a dyn ConfigStore,
        error_code: Option<String>,
    ) -> Self {
        Self {
            runtime,
            store,
            error_code: error_code.filter(|c| !c.is_empty()),
        }
    }

    /// Check every root and map the folded outcome.
    ///
    /// All roots are processed even after an invalid one.
    ///
    /// # Errors
    ///
    /// Stops at the first content, classifier or configuration store
    /// failure.
    pub async fn execute(&self, roots: &[NodeId]) -> Result<StepOutcome, EngineError> {
        let orchestrator = TreeOrchestrator::new(self.runtime, self.store);

        let mut passed = true;
        for root in roots {
            let valid = orchestrator.process_master(root).await?;
            debug!(master = %root, valid, "master processed");
            passed &= valid;
        }

        let outcome = match (&self.error_code, passed) {
            (Some(code), false) => StepOutcome::Fail {
                error_code: code.clone(),
            },
            _ => StepOutcome::Complete { passed },
        };
        info!(roots = roots.len(), %outcome, "check step finished");
        Ok(outcome)
    }
}
