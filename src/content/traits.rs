//! content::traits
//!
//! Access to the content tree the checks run against.
//!
//! # Design
//!
//! The trait is async because the tree usually lives in a remote content
//! repository. The engine only reads nodes and writes properties back; it
//! never caches nodes beyond the current traversal.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::{ContentPart, Node, NodeId, Properties};

/// Errors from content tree operations.
#[derive(Debug, Clone, Error)]
pub enum ContentError {
    /// The node does not exist.
    #[error("node not found: {0}")]
    NotFound(NodeId),

    /// Children were requested for a node that is not a container.
    #[error("node is not a container: {0}")]
    NotContainer(NodeId),

    /// The backing repository failed.
    #[error("content backend error: {0}")]
    Backend(String),

    /// A node was reached again through its own descendants.
    #[error("cycle through node '{0}'")]
    Cycle(NodeId),

    /// A tree fixture could not be loaded.
    #[error("invalid tree fixture '{path}': {message}")]
    Fixture { path: String, message: String },
}

/// The content tree collaborator.
///
/// # Errors
///
/// All methods return `ContentError::NotFound` for unknown identifiers.
/// Other failures are reported as `ContentError::Backend` and are fatal
/// for the current master.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Get the fully attached form of a node.
    async fn get_item(&self, id: &NodeId) -> Result<Node, ContentError>;

    /// List the children of a container, in repository order.
    async fn child_items(&self, id: &NodeId) -> Result<Vec<Node>, ContentError>;

    /// List the content parts of a document, in repository order.
    async fn content_parts(&self, id: &NodeId) -> Result<Vec<ContentPart>, ContentError>;

    /// Write a batch of properties onto a node.
    async fn modify_properties(&self, id: &NodeId, properties: &Properties)
        -> Result<(), ContentError>;
}
