//! cli
//!
//! Command-line interface layer for fraudcheck.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! [`crate::engine`] for execution. Logs go to stderr so that command output
//! on stdout stays machine-readable.

pub mod args;
pub mod commands;

pub use args::Cli;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Explicit configuration file
    pub config: Option<PathBuf>,
    /// Debug logging enabled
    pub debug: bool,
    /// Only print errors
    pub quiet: bool,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse_args();

    let ctx = Context {
        config: cli.config.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };
    init_logging(&ctx);

    commands::dispatch(cli.command, &ctx)
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` takes precedence over the flags.
fn init_logging(ctx: &Context) {
    let default_level = if ctx.debug {
        "fraudcheck=debug"
    } else if ctx.quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second install (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
