//! core::types
//!
//! Strong types for the node tree and classification results.
//!
//! # Types
//!
//! - [`NodeId`] - Identifier of a node in the content tree
//! - [`Node`] - A container or leaf carrying one or more type identifiers
//! - [`ContentPart`] - A named chunk of document content
//! - [`CheckResult`] / [`DetailOutcome`] - Outcome of one classification call
//! - [`Properties`] - Property bag written back onto a node
//!
//! # Examples
//!
//! ```
//! use fraudcheck::core::types::{Node, NodeKind};
//!
//! let folder = Node::container("f1", "Customer file", ["FOLDER1"]);
//! assert!(folder.is_container());
//! assert!(folder.has_any_type(&["FOLDER1".to_string()]));
//!
//! let invoice = Node::leaf("d1", "invoice.png", ["INVOICE", "SCAN"]);
//! assert_eq!(invoice.kind, NodeKind::Leaf);
//! assert_eq!(invoice.type_ids.len(), 2);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Property values written onto a node, keyed by property name.
pub type Properties = BTreeMap<String, Value>;

/// Identifier of a node in the content tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Capability tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Folder-like node whose children can be listed
    Container,
    /// Document-like node with retrievable content
    Leaf,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Container => write!(f, "container"),
            NodeKind::Leaf => write!(f, "leaf"),
        }
    }
}

/// A node of the content tree.
///
/// A node may satisfy several type identifiers at once. The first one is
/// its primary type, used in log messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Node identifier
    pub id: NodeId,
    /// Display name
    pub name: String,
    /// Type identifiers, primary first
    pub type_ids: Vec<String>,
    /// Container or leaf
    pub kind: NodeKind,
}

impl Node {
    /// Create a node.
    pub fn new<I, S>(id: impl Into<NodeId>, name: impl Into<String>, types: I, kind: NodeKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            type_ids: types.into_iter().map(Into::into).collect(),
            kind,
        }
    }

    /// Create a container node.
    pub fn container<I, S>(id: impl Into<NodeId>, name: impl Into<String>, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(id, name, types, NodeKind::Container)
    }

    /// Create a leaf node.
    pub fn leaf<I, S>(id: impl Into<NodeId>, name: impl Into<String>, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(id, name, types, NodeKind::Leaf)
    }

    /// Check if this node is a container.
    pub fn is_container(&self) -> bool {
        self.kind == NodeKind::Container
    }

    /// Primary type identifier, or an empty string for untyped nodes.
    pub fn primary_type(&self) -> &str {
        self.type_ids.first().map(String::as_str).unwrap_or("")
    }

    /// Check if any of this node's types appears in `wanted`.
    pub fn has_any_type(&self, wanted: &[String]) -> bool {
        self.type_ids.iter().any(|t| wanted.contains(t))
    }
}

/// A named chunk of document content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPart {
    /// Original file name
    pub name: String,
    /// Raw bytes
    pub content: Vec<u8>,
}

impl ContentPart {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Outcome of one named sub-check reported by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailOutcome {
    /// Upper-cased sub-check name
    pub name: String,
    /// Whether the sub-check status is `SUCCESS`
    pub success: bool,
    /// Upper-cased status text
    pub status_text: String,
    /// Human readable description
    pub description: String,
}

/// Outcome of one classification call.
///
/// Produced once per checked node and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    /// Overall validity verdict of the document
    pub valid: bool,
    /// Whether the call status is `SUCCESS`
    pub success: bool,
    /// Upper-cased status text
    pub status_text: String,
    /// Per sub-check outcomes, in response order
    pub details: Vec<DetailOutcome>,
}

impl CheckResult {
    /// Result used when there is nothing to submit.
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Expression binding for this result.
    ///
    /// Exposes `status` as an alias of `success` on the result and on
    /// each detail, matching the bean-style names mapping rules use.
    pub fn to_binding(&self) -> Value {
        let details: Vec<Value> = self
            .details
            .iter()
            .map(|d| {
                json!({
                    "name": d.name,
                    "success": d.success,
                    "status": d.success,
                    "statusText": d.status_text,
                    "description": d.description,
                })
            })
            .collect();

        json!({
            "valid": self.valid,
            "success": self.success,
            "status": self.success,
            "statusText": self.status_text,
            "details": details,
        })
    }
}
