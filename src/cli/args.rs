//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this configuration file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Only print errors

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// fraudcheck - Check documents in a content tree for fraud
#[derive(Parser, Debug)]
#[command(name = "fraudcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $FRAUDCHECK_CONFIG, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true, conflicts_with = "quiet")]
    pub debug: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the check step over a content tree
    #[command(
        name = "run",
        long_about = "Run the check step over a content tree.\n\n\
            Loads a JSON tree fixture, checks every root as a master node, sends \
            each selected document to the classification service, and writes the \
            mapped properties back onto the nodes.\n\n\
            The exit code is 1 when the step fails, that is when some document is \
            invalid and `bpmnError` is configured.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Check every root of a tree
    fraudcheck run --tree case.json

    # Check selected roots only
    fraudcheck run --tree case.json --root folder-1 --root folder-2

    # Print the outcome and written properties as JSON
    fraudcheck run --tree case.json --json"
    )]
    Run {
        /// JSON tree fixture to load
        #[arg(long, value_name = "FILE")]
        tree: PathBuf,

        /// Root node to check (repeatable; defaults to the fixture's roots)
        #[arg(long = "root", value_name = "ID")]
        roots: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how directives resolve for a type combination
    #[command(
        name = "explain",
        long_about = "Show how directives resolve for a type combination.\n\n\
            Prints the candidate configuration keys, the detail type list, the \
            check algorithm, and the mapping rules that would apply to a detail \
            of the given types below a master of the given types. No network \
            call is made.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Which rules apply to invoices in a FOLDER1 case?
    fraudcheck explain --master-type FOLDER1 --detail-type INVOICE

    # Nodes with several types
    fraudcheck explain --master-type FOLDER1 --master-type CASE --detail-type SCAN"
    )]
    Explain {
        /// Master node type (repeatable, in node order)
        #[arg(long = "master-type", value_name = "TYPE")]
        master_types: Vec<String>,

        /// Detail node type (repeatable, in node order)
        #[arg(long = "detail-type", value_name = "TYPE")]
        detail_types: Vec<String>,
    },
}
