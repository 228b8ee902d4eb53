//! content::memory
//!
//! In-memory content tree.
//!
//! # Design
//!
//! Stores nodes, parent/child links, content parts and written properties
//! in memory, records every call for verification, and can be configured
//! to fail a given call. It backs the tests and the CLI, which loads it
//! from a JSON fixture:
//!
//! ```json
//! {
//!   "roots": ["f1"],
//!   "nodes": [
//!     {"id": "f1", "name": "Customer", "types": ["FOLDER1"], "kind": "container", "children": ["d1"]},
//!     {"id": "d1", "name": "Invoice", "types": ["INVOICE"], "kind": "leaf",
//!      "content": [{"name": "scan.png", "file": "scan.png"}]}
//!   ]
//! }
//! ```
//!
//! # Example
//!
//! ```
//! use fraudcheck::content::{ContentService, MemoryContentService};
//! use fraudcheck::core::types::{ContentPart, Node, NodeId};
//!
//! # tokio_test::block_on(async {
//! let tree = MemoryContentService::new();
//! tree.insert(Node::container("f1", "Customer", ["FOLDER1"]));
//! tree.insert_child(&NodeId::new("f1"), Node::leaf("d1", "Invoice", ["INVOICE"]));
//! tree.set_content(&NodeId::new("d1"), vec![ContentPart::new("scan.png", b"...".to_vec())]);
//!
//! let children = tree.child_items(&NodeId::new("f1")).await.unwrap();
//! assert_eq!(children.len(), 1);
//! assert_eq!(children[0].name, "Invoice");
//! # });
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;

use super::traits::{ContentError, ContentService};
use crate::core::types::{ContentPart, Node, NodeId, NodeKind, Properties};

/// In-memory content tree.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentService {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    nodes: HashMap<NodeId, Node>,
    children: HashMap<NodeId, Vec<NodeId>>,
    parts: HashMap<NodeId, Vec<ContentPart>>,
    properties: HashMap<NodeId, Properties>,
    fail_on: Option<FailOn>,
    operations: Vec<ContentOperation>,
}

/// Configuration for which call should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    GetItem(ContentError),
    ChildItems(ContentError),
    ContentParts(ContentError),
    ModifyProperties(ContentError),
}

/// Recorded call for test verification.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentOperation {
    GetItem { id: NodeId },
    ChildItems { id: NodeId },
    ContentParts { id: NodeId },
    ModifyProperties { id: NodeId, properties: Properties },
}

/// A tree loaded from a fixture file.
#[derive(Debug, Clone)]
pub struct LoadedTree {
    /// The populated content service
    pub service: MemoryContentService,
    /// Root nodes to check, in fixture order
    pub roots: Vec<NodeId>,
}

impl MemoryContentService {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node without a parent.
    pub fn insert(&self, node: Node) {
        let mut inner = self.inner.lock().unwrap();
        inner.nodes.insert(node.id.clone(), node);
    }

    /// Insert a node as the last child of `parent`.
    pub fn insert_child(&self, parent: &NodeId, node: Node) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .children
            .entry(parent.clone())
            .or_default()
            .push(node.id.clone());
        inner.nodes.insert(node.id.clone(), node);
    }

    /// Set the content parts of a document.
    pub fn set_content(&self, id: &NodeId, parts: Vec<ContentPart>) {
        let mut inner = self.inner.lock().unwrap();
        inner.parts.insert(id.clone(), parts);
    }

    /// Configure the service to fail a specific call.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on = Some(fail_on);
        }
        self
    }

    /// Properties written so far onto a node.
    pub fn properties(&self, id: &NodeId) -> Properties {
        let inner = self.inner.lock().unwrap();
        inner.properties.get(id).cloned().unwrap_or_default()
    }

    /// All nodes that received properties, with their current values.
    pub fn all_properties(&self) -> Vec<(NodeId, Properties)> {
        let inner = self.inner.lock().unwrap();
        let mut all: Vec<_> = inner
            .properties
            .iter()
            .map(|(id, props)| (id.clone(), props.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<ContentOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Count recorded property writes.
    pub fn write_count(&self) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, ContentOperation::ModifyProperties { .. }))
            .count()
    }

    /// Load a tree from a JSON fixture file.
    ///
    /// Content `file` paths are resolved relative to the fixture. When the
    /// fixture lists no roots, every node that is nobody's child is a root.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Fixture` if the file cannot be read or is
    /// malformed.
    pub fn load_fixture(path: &Path) -> Result<LoadedTree, ContentError> {
        let fixture_error = |message: String| ContentError::Fixture {
            path: path.display().to_string(),
            message,
        };

        let contents = fs::read_to_string(path).map_err(|e| fixture_error(e.to_string()))?;
        let fixture: FixtureFile =
            serde_json::from_str(&contents).map_err(|e| fixture_error(e.to_string()))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        Self::from_fixture(fixture, &base_dir).map_err(fixture_error)
    }

    fn from_fixture(fixture: FixtureFile, base_dir: &Path) -> Result<LoadedTree, String> {
        let service = Self::new();
        let known: HashMap<&str, &FixtureNode> =
            fixture.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

        let mut parented: Vec<&str> = Vec::new();
        for node in &fixture.nodes {
            if node.kind == NodeKind::Leaf && !node.children.is_empty() {
                return Err(format!("leaf node '{}' cannot have children", node.id));
            }
            for child in &node.children {
                if !known.contains_key(child.as_str()) {
                    return Err(format!("node '{}' lists unknown child '{}'", node.id, child));
                }
                parented.push(child);
            }
        }
        if let Some(id) = find_cycle(&fixture.nodes, &known) {
            return Err(format!("cycle through node '{}'", id));
        }

        let mut inner = service.inner.lock().unwrap();
        for node in &fixture.nodes {
            let id = NodeId::new(&node.id);
            inner.nodes.insert(
                id.clone(),
                Node::new(
                    id.clone(),
                    node.name.clone().unwrap_or_else(|| node.id.clone()),
                    node.types.iter().cloned(),
                    node.kind,
                ),
            );
            if !node.children.is_empty() {
                inner
                    .children
                    .insert(id.clone(), node.children.iter().map(NodeId::new).collect());
            }
            if !node.content.is_empty() {
                let parts = node
                    .content
                    .iter()
                    .map(|p| p.load(base_dir, &node.id))
                    .collect::<Result<Vec<_>, _>>()?;
                inner.parts.insert(id, parts);
            }
        }
        drop(inner);

        let roots = if fixture.roots.is_empty() {
            fixture
                .nodes
                .iter()
                .filter(|n| !parented.contains(&n.id.as_str()))
                .map(|n| NodeId::new(&n.id))
                .collect()
        } else {
            for root in &fixture.roots {
                if !known.contains_key(root.as_str()) {
                    return Err(format!("unknown root '{}'", root));
                }
            }
            fixture.roots.iter().map(NodeId::new).collect()
        };

        Ok(LoadedTree { service, roots })
    }

    fn record(&self, op: ContentOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }

    fn check_fail(&self, expected: &str) -> Option<ContentError> {
        let inner = self.inner.lock().unwrap();
        match &inner.fail_on {
            Some(FailOn::GetItem(e)) if expected == "get_item" => Some(e.clone()),
            Some(FailOn::ChildItems(e)) if expected == "child_items" => Some(e.clone()),
            Some(FailOn::ContentParts(e)) if expected == "content_parts" => Some(e.clone()),
            Some(FailOn::ModifyProperties(e)) if expected == "modify_properties" => {
                Some(e.clone())
            }
            _ => None,
        }
    }
}

#[async_trait]
impl ContentService for MemoryContentService {
    async fn get_item(&self, id: &NodeId) -> Result<Node, ContentError> {
        self.record(ContentOperation::GetItem { id: id.clone() });
        if let Some(e) = self.check_fail("get_item") {
            return Err(e);
        }

        let inner = self.inner.lock().unwrap();
        inner
            .nodes
            .get(id)
            .cloned()
            .ok_or_else(|| ContentError::NotFound(id.clone()))
    }

    async fn child_items(&self, id: &NodeId) -> Result<Vec<Node>, ContentError> {
        self.record(ContentOperation::ChildItems { id: id.clone() });
        if let Some(e) = self.check_fail("child_items") {
            return Err(e);
        }

        let inner = self.inner.lock().unwrap();
        let node = inner
            .nodes
            .get(id)
            .ok_or_else(|| ContentError::NotFound(id.clone()))?;
        if !node.is_container() {
            return Err(ContentError::NotContainer(id.clone()));
        }

        Ok(inner
            .children
            .get(id)
            .map(|ids| ids.iter().filter_map(|c| inner.nodes.get(c).cloned()).collect())
            .unwrap_or_default())
    }

    async fn content_parts(&self, id: &NodeId) -> Result<Vec<ContentPart>, ContentError> {
        self.record(ContentOperation::ContentParts { id: id.clone() });
        if let Some(e) = self.check_fail("content_parts") {
            return Err(e);
        }

        let inner = self.inner.lock().unwrap();
        if !inner.nodes.contains_key(id) {
            return Err(ContentError::NotFound(id.clone()));
        }
        Ok(inner.parts.get(id).cloned().unwrap_or_default())
    }

    async fn modify_properties(
        &self,
        id: &NodeId,
        properties: &Properties,
    ) -> Result<(), ContentError> {
        self.record(ContentOperation::ModifyProperties {
            id: id.clone(),
            properties: properties.clone(),
        });
        if let Some(e) = self.check_fail("modify_properties") {
            return Err(e);
        }

        let mut inner = self.inner.lock().unwrap();
        if !inner.nodes.contains_key(id) {
            return Err(ContentError::NotFound(id.clone()));
        }
        inner
            .properties
            .entry(id.clone())
            .or_default()
            .extend(properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Mark {
    OnPath,
    Done,
}

/// Depth-first search over child links; returns a node that is its own
/// descendant, if any. Ids missing from `known` are treated as leaves.
fn find_cycle<'f>(
    nodes: &'f [FixtureNode],
    known: &HashMap<&'f str, &'f FixtureNode>,
) -> Option<&'f str> {
    let mut marks: HashMap<&'f str, Mark> = HashMap::new();

    for start in nodes {
        if marks.contains_key(start.id.as_str()) {
            continue;
        }
        marks.insert(start.id.as_str(), Mark::OnPath);
        // (node, index of the next child to visit)
        let mut stack: Vec<(&'f str, usize)> = vec![(start.id.as_str(), 0)];

        while let Some(&(id, next)) = stack.last() {
            let child = known.get(id).and_then(|node| node.children.get(next));
            match child {
                Some(child) => {
                    if let Some(top) = stack.last_mut() {
                        top.1 += 1;
                    }
                    match marks.get(child.as_str()) {
                        Some(Mark::OnPath) => return Some(child.as_str()),
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(child.as_str(), Mark::OnPath);
                            stack.push((child.as_str(), 0));
                        }
                    }
                }
                None => {
                    marks.insert(id, Mark::Done);
                    stack.pop();
                }
            }
        }
    }
    None
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureFile {
    #[serde(default)]
    roots: Vec<String>,
    nodes: Vec<FixtureNode>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureNode {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    kind: NodeKind,
    #[serde(default)]
    children: Vec<String>,
    #[serde(default)]
    content: Vec<FixturePart>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixturePart {
    name: String,
    #[serde(default)]
    file: Option<PathBuf>,
    #[serde(default)]
    text: Option<String>,
}

impl FixturePart {
    fn load(&self, base_dir: &Path, node_id: &str) -> Result<ContentPart, String> {
        match (&self.file, &self.text) {
            (Some(file), None) => {
                let path = base_dir.join(file);
                let bytes = fs::read(&path)
                    .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
                Ok(ContentPart::new(&self.name, bytes))
            }
            (None, Some(text)) => Ok(ContentPart::new(&self.name, text.as_bytes().to_vec())),
            _ => Err(format!(
                "content part '{}' of node '{}' needs exactly one of 'file' or 'text'",
                self.name, node_id
            )),
        }
    }
}
