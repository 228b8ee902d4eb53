//! content
//!
//! Abstraction over the content tree (folders and documents).
//!
//! # Modules
//!
//! - `traits`: Core `ContentService` trait and `ContentError`
//! - [`memory`]: In-memory tree for tests and fixture-driven runs

pub mod memory;
mod traits;

pub use memory::{LoadedTree, MemoryContentService};
pub use traits::*;
