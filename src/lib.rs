//! fraudcheck - Document fraud classification for content workflows
//!
//! fraudcheck is a workflow step that walks a tree of content nodes, sends
//! selected documents to a remote fraud-classification service, and writes
//! configurable properties derived from each verdict back onto the nodes.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Orchestrates Resolve → Traverse → Check → Map → Fold
//! - [`core`] - Domain types, key composition, configuration
//! - [`content`] - Abstraction over the content repository
//! - [`classifier`] - Abstraction over the classification service
//! - [`mapping`] - Expression rules turning verdicts into properties
//!
//! # Behavioral Guarantees
//!
//! 1. Every matching detail node is checked, even after a failure
//! 2. Each checked document causes exactly one classifier call
//! 3. One bad mapping rule never prevents the others from being written
//! 4. The step fails only when an error code is configured

pub mod classifier;
pub mod cli;
pub mod content;
pub mod core;
pub mod engine;
pub mod mapping;
