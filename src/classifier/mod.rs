//! classifier
//!
//! Abstraction for the document fraud classifier.
//!
//! # Modules
//!
//! - `traits`: Core `Classifier` trait and `ClassifierError`
//! - [`saas`]: HTTP client for the hosted classification service
//! - [`mock`]: Mock implementation for deterministic testing

pub mod mock;
pub mod saas;
mod traits;

pub use saas::SaasClassifier;
pub use traits::*;
