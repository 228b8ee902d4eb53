//! engine::orchestrator
//!
//! Tree traversal deciding which nodes are checked.
//!
//! # Algorithm
//!
//! For a master node:
//! 1. A leaf master is its own (only) detail.
//! 2. A container master looks up `master.<type>.details`. Without it, the
//!    master is its own detail.
//! 3. Otherwise the tree below the master is searched. A node whose types
//!    intersect the configured detail types is checked; containers are
//!    descended into; anything else contributes `true`.
//!
//! Outcomes are folded with logical AND. Every node is visited even after
//! a failure, so every matching detail receives its properties. A container
//! reached again below itself aborts the walk with `ContentError::Cycle`.
//!
//! # Send Step
//!
//! Only the first content part of a document is submitted. A container
//! given as a detail is replaced by its first child. Missing nodes, empty
//! containers and documents without content yield an invalid result
//! without calling the classifier.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

use tracing::{debug, info, warn};

use super::directives::{
    algorithm_keys, detail_types_keys, mapping_prefixes, parse_type_list, DEFAULT_ALGORITHM,
};
use super::{EngineError, Runtime};
use crate::content::ContentError;
use crate::core::config::{ConfigResolver, ConfigStore};
use crate::core::types::{CheckResult, Node, NodeId, NodeKind};
use crate::mapping::PropertyMapper;

type BoxFuture<'b, T> = Pin<Box<dyn Future<Output = T> + Send + 'b>>;

/// Walks master nodes and checks their details.
pub struct TreeOrchestrator<'a> {
    runtime: &'a Runtime,
    config: ConfigResolver<'a>,
}

impl<'a> TreeOrchestrator<'a> {
    pub fn new(runtime: &'a Runtime, store: &'a dyn ConfigStore) -> Self {
        Self {
            runtime,
            config: ConfigResolver::new(store),
        }
    }

    /// Check every detail of a master node.
    ///
    /// # Errors
    ///
    /// Propagates content, classifier and configuration store failures.
    pub async fn process_master(&self, master_id: &NodeId) -> Result<bool, EngineError> {
        let master = self.runtime.content.get_item(master_id).await?;

        debug!(
            master = %master.id,
            name = %master.name,
            node_type = master.primary_type(),
            "processing master"
        );

        if master.kind == NodeKind::Leaf {
            return self.process_detail(&master, &master).await;
        }

        let configured = self
            .config
            .resolve_one(&detail_types_keys(&master.type_ids), None)?;

        match configured {
            None => {
                info!(
                    master = %master.id,
                    node_type = master.primary_type(),
                    "no detail types configured, checking the master itself"
                );
                self.process_detail(&master, &master).await
            }
            Some(list) => {
                let detail_types = parse_type_list(&list);
                self.process_tree(&master, &master, &detail_types).await
            }
        }
    }

    /// Search `current` and its descendants for details of `master`.
    ///
    /// A container without matching descendants yields `true`.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Cycle` if a container is its own descendant.
    pub fn process_tree<'b>(
        &'b self,
        master: &'b Node,
        current: &'b Node,
        detail_types: &'b [String],
    ) -> BoxFuture<'b, Result<bool, EngineError>> {
        Box::pin(async move {
            let mut path = HashSet::new();
            self.walk(master, current, detail_types, &mut path).await
        })
    }

    /// `path` holds the containers between the master and `current`.
    fn walk<'b>(
        &'b self,
        master: &'b Node,
        current: &'b Node,
        detail_types: &'b [String],
        path: &'b mut HashSet<NodeId>,
    ) -> BoxFuture<'b, Result<bool, EngineError>> {
        Box::pin(async move {
            if current.has_any_type(detail_types) {
                return self.process_detail(master, current).await;
            }
            if !current.is_container() {
                return Ok(true);
            }
            if !path.insert(current.id.clone()) {
                return Err(ContentError::Cycle(current.id.clone()).into());
            }

            let children = self.runtime.content.child_items(&current.id).await?;
            let mut outcome = true;
            for child in &children {
                outcome &= self.walk(master, child, detail_types, path).await?;
            }
            path.remove(&current.id);
            Ok(outcome)
        })
    }

    /// Check one detail node and write its mapped properties.
    ///
    /// Returns the classifier's validity verdict.
    pub async fn process_detail(&self, master: &Node, detail: &Node) -> Result<bool, EngineError> {
        debug!(
            detail = %detail.id,
            name = %detail.name,
            node_type = detail.primary_type(),
            master = %master.id,
            "processing detail"
        );

        let algorithm = self
            .config
            .resolve_one(&algorithm_keys(&detail.type_ids), Some(DEFAULT_ALGORITHM))?
            .unwrap_or_else(|| DEFAULT_ALGORITHM.to_string());

        let result = self.check_node(&algorithm, Some(detail)).await?;

        let rules = self
            .config
            .resolve_bundle(&mapping_prefixes(&master.type_ids, &detail.type_ids))?;
        let properties =
            PropertyMapper::new(self.runtime.evaluator.as_ref()).evaluate_all(&rules, &result);

        debug!(detail = %detail.id, ?properties, "mapped properties");

        if !properties.is_empty() {
            self.runtime
                .content
                .modify_properties(&detail.id, &properties)
                .await?;
        }

        Ok(result.valid)
    }

    /// Submit a node to the classifier.
    ///
    /// `None`, an empty container, or a document without content yields an
    /// invalid result and no classifier call.
    pub async fn check_node(
        &self,
        algorithm: &str,
        node: Option<&Node>,
    ) -> Result<CheckResult, EngineError> {
        let Some(mut node) = node.cloned() else {
            warn!("no node to check");
            return Ok(CheckResult::invalid());
        };

        let mut descended = HashSet::new();
        while node.is_container() {
            if !descended.insert(node.id.clone()) {
                return Err(ContentError::Cycle(node.id).into());
            }
            let children = self.runtime.content.child_items(&node.id).await?;
            match children.into_iter().next() {
                Some(first) => node = first,
                None => {
                    warn!(node = %node.id, "container has no children, nothing to check");
                    return Ok(CheckResult::invalid());
                }
            }
        }

        let parts = self.runtime.content.content_parts(&node.id).await?;
        let Some(part) = parts.into_iter().next() else {
            warn!(node = %node.id, "document has no content, nothing to check");
            return Ok(CheckResult::invalid());
        };

        debug!(
            document = %node.id,
            name = %node.name,
            node_type = node.primary_type(),
            size = part.content.len(),
            %algorithm,
            classifier = self.runtime.classifier.name(),
            "sending document"
        );

        Ok(self.runtime.classifier.check(algorithm, &part).await?)
    }
}
