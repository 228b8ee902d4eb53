//! cli::commands::run
//!
//! Run the check step over a content tree loaded from a JSON fixture.
//!
//! # Example
//!
//! ```bash
//! # Check every root of the fixture
//! fraudcheck run --tree case.json
//!
//! # Machine-readable output
//! fraudcheck run --tree case.json --root folder-1 --json
//! ```

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde_json::{json, Map, Value};
use tracing::debug;

use super::load_store;
use crate::classifier::SaasClassifier;
use crate::cli::Context;
use crate::content::MemoryContentService;
use crate::core::config::ServiceSettings;
use crate::core::types::NodeId;
use crate::engine::{CheckStep, Runtime, StepOutcome};

/// Run the check step.
///
/// This is a synchronous wrapper that uses tokio to run the async implementation.
pub fn run(ctx: &Context, tree: &Path, roots: &[String], json: bool) -> Result<ExitCode> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(ctx, tree, roots, json))
}

async fn run_async(ctx: &Context, tree: &Path, roots: &[String], json: bool) -> Result<ExitCode> {
    let store = load_store(ctx)?;
    let settings = ServiceSettings::from_store(&store)?;

    let loaded = MemoryContentService::load_fixture(tree)?;
    let roots: Vec<NodeId> = if roots.is_empty() {
        loaded.roots.clone()
    } else {
        roots.iter().map(NodeId::new).collect()
    };

    let content = Arc::new(loaded.service);
    let classifier = Arc::new(SaasClassifier::new(&settings));
    debug!(endpoint = classifier.endpoint(), roots = roots.len(), "running check step");
    let runtime = Runtime::new(content.clone(), classifier);

    let step = CheckStep::new(&runtime, &store, settings.bpmn_error.clone());
    let outcome = step
        .execute(&roots)
        .await
        .context("Check step aborted")?;

    if json {
        let mut written = Map::new();
        for (id, properties) in content.all_properties() {
            written.insert(id.to_string(), json!(properties));
        }
        let report = json!({
            "outcome": outcome,
            "roots": roots,
            "properties": Value::Object(written),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !ctx.quiet {
        println!("Checked {} root(s): {}", roots.len(), outcome);
        for (id, properties) in content.all_properties() {
            println!("  {}", id);
            for (key, value) in &properties {
                println!("    {} = {}", key, value);
            }
        }
    }

    Ok(match outcome {
        StepOutcome::Fail { .. } => ExitCode::from(1),
        StepOutcome::Complete { .. } => ExitCode::SUCCESS,
    })
}
