//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads the configuration store
//! 2. Calls the engine
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! `run` talks to the classification service over HTTP. Its handler is a
//! synchronous wrapper that drives the async implementation on a tokio
//! runtime.

mod explain;
mod run;

pub use explain::explain;
pub use run::run;

use std::process::ExitCode;

use anyhow::{Context as _, Result};
use tracing::debug;

use super::args::Command;
use super::Context;
use crate::core::config::{locate_config_file, MapConfigStore};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<ExitCode> {
    match command {
        Command::Run { tree, roots, json } => run::run(ctx, &tree, &roots, json),
        Command::Explain {
            master_types,
            detail_types,
        } => explain::explain(ctx, &master_types, &detail_types).map(|()| ExitCode::SUCCESS),
    }
}

/// Locate and load the configuration store.
pub(crate) fn load_store(ctx: &Context) -> Result<MapConfigStore> {
    let path = locate_config_file(ctx.config.as_deref())?;
    debug!(path = %path.display(), "loading configuration");
    MapConfigStore::load(&path).context("Failed to load configuration")
}
