//! mapping
//!
//! Projection of a check result onto node properties.
//!
//! # Design
//!
//! Each mapping rule pairs a property key with an expression. Rules are
//! evaluated independently against a binding named `result` that exposes
//! the [`CheckResult`]. A rule that fails to evaluate is logged and left
//! out; it never stops the other rules. A rule evaluating to `null` sets
//! nothing.
//!
//! The expression engine sits behind [`ExpressionEvaluator`];
//! [`ScriptEvaluator`] is the built-in implementation.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use fraudcheck::core::types::CheckResult;
//! use fraudcheck::mapping::{PropertyMapper, ScriptEvaluator};
//!
//! let evaluator = ScriptEvaluator::new();
//! let mapper = PropertyMapper::new(&evaluator);
//!
//! let mut rules = BTreeMap::new();
//! rules.insert("fraudValid".to_string(), "result.valid".to_string());
//! rules.insert("broken".to_string(), "result.(".to_string());
//!
//! let properties = mapper.evaluate_all(&rules, &CheckResult::invalid());
//! assert_eq!(properties["fraudValid"], serde_json::json!(false));
//! assert!(!properties.contains_key("broken"));
//! ```

pub mod script;

pub use script::ScriptEvaluator;

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use crate::core::types::{CheckResult, Properties};

/// Name under which the check result is bound.
pub const RESULT_BINDING: &str = "result";

/// Named values visible to an expression.
pub type Bindings = BTreeMap<String, Value>;

/// Errors from expression evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    /// The expression could not be parsed.
    #[error("syntax error at offset {position}: {message}")]
    Syntax { position: usize, message: String },

    /// The expression refers to an unbound name.
    #[error("'{0}' is not defined")]
    Reference(String),

    /// An operation was applied to a value of the wrong type.
    #[error("type error: {0}")]
    Type(String),
}

/// A pluggable expression engine.
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluate `source` with the given bindings.
    fn evaluate(&self, source: &str, bindings: &Bindings) -> Result<Value, ExpressionError>;

    /// Check that `source` is well formed without evaluating it.
    fn check_syntax(&self, _source: &str) -> Result<(), ExpressionError> {
        Ok(())
    }
}

/// Evaluates mapping rules against check results.
#[derive(Clone, Copy)]
pub struct PropertyMapper<'a> {
    evaluator: &'a dyn ExpressionEvaluator,
}

impl<'a> PropertyMapper<'a> {
    pub fn new(evaluator: &'a dyn ExpressionEvaluator) -> Self {
        Self { evaluator }
    }

    /// Evaluate every rule (property key → expression) against `result`.
    ///
    /// Failing rules are logged and omitted from the returned properties.
    pub fn evaluate_all(&self, rules: &BTreeMap<String, String>, result: &CheckResult) -> Properties {
        let mut bindings = Bindings::new();
        bindings.insert(RESULT_BINDING.to_string(), result.to_binding());

        let mut properties = Properties::new();
        for (key, source) in rules {
            match self.evaluator.evaluate(source, &bindings) {
                Ok(Value::Null) => {
                    debug!(property = %key, expression = %source, "mapping evaluated to null, skipped");
                }
                Ok(value) => {
                    properties.insert(key.clone(), value);
                }
                Err(e) => {
                    error!(
                        property = %key,
                        expression = %source,
                        error = %e,
                        "cannot map property"
                    );
                }
            }
        }
        properties
    }
}
