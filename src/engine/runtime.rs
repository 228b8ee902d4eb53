//! engine::runtime
//!
//! Shared collaborator handles.
//!
//! A [`Runtime`] is built once at process start and passed by reference to
//! every step. It holds no per-call state, so a single instance serves any
//! number of invocations.

use std::sync::Arc;

use crate::classifier::Classifier;
use crate::content::ContentService;
use crate::mapping::{ExpressionEvaluator, ScriptEvaluator};

/// Collaborators used by the engine.
#[derive(Clone)]
pub struct Runtime {
    /// Content tree access
    pub content: Arc<dyn ContentService>,
    /// Document classifier
    pub classifier: Arc<dyn Classifier>,
    /// Expression engine for mapping rules
    pub evaluator: Arc<dyn ExpressionEvaluator>,
}

impl Runtime {
    /// Create a runtime using the built-in [`ScriptEvaluator`].
    pub fn new(content: Arc<dyn ContentService>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            content,
            classifier,
            evaluator: Arc::new(ScriptEvaluator::new()),
        }
    }

    /// Replace the expression engine.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("classifier", &self.classifier.name())
            .finish_non_exhaustive()
    }
}
