//! # ideabridge CLI Module
//!
//! ## Available Commands
//!
//! - `convert` - JSON document to attribute tree (and optional snapshot)
//! - `inspect` - Print a JSON document or binary snapshot as a tree
//! - `inject` - Inject a document into a fresh input link and dump the edges
//! - `path build` / `path graft` - Dotted path documents
//! - `coerce` - Coerce a value to a numeric kind
//! - `materialize` - Materialize the commands of an output-link document
//! - `cycle` - Run one cycle against a remote kernel
//! - `server` - Start the HTTP server

mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use ideabridge_core::BridgeError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// ideabridge - symbolic state bridge
///
/// Converts between JSON documents, attribute trees, kernel working memory
/// and typed records.
#[derive(Parser, Debug)]
#[command(name = "ideabridge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// TOML file declaring the record types of output-link commands
    #[arg(short = 'R', long, global = true)]
    pub records: Option<PathBuf>,

    /// Namespace that qualifies command names (overrides the records file)
    #[arg(short = 'N', long, global = true)]
    pub namespace: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Convert a JSON document to an attribute tree
    Convert {
        /// Path to the JSON document
        #[arg(short, long)]
        file: PathBuf,

        /// Also write the tree as a binary snapshot
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },

    /// Print a JSON document or binary snapshot as a tree
    Inspect {
        /// Path to the JSON document or snapshot
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Inject a JSON document into a fresh input link and dump its edges
    Inject {
        /// Path to the JSON document
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Dotted path documents
    Path {
        #[command(subcommand)]
        action: PathCommand,
    },

    /// Coerce a value to a numeric kind (double, float, int, short, long)
    Coerce {
        /// Value to coerce
        value: String,

        /// Target kind
        kind: String,
    },

    /// Materialize every command of an output-link document
    Materialize {
        /// Path to the output-link JSON document
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Send an input-link document to a kernel and materialize its reply
    Cycle {
        /// Path to the input-link JSON document
        #[arg(short, long)]
        file: PathBuf,

        /// Kernel base URL (defaults to IDEABRIDGE_KERNEL_URL)
        #[arg(short = 'k', long)]
        kernel_url: Option<String>,

        /// Timeout in seconds (defaults to IDEABRIDGE_KERNEL_TIMEOUT_SECS)
        #[arg(short, long)]
        timeout: Option<u64>,
    },
}

/// `path` subcommands. Values parse as JSON and fall back to plain strings.
#[derive(Subcommand, Debug)]
pub enum PathCommand {
    /// Build `{"A": {"B": value}}` from `A.B value`
    Build {
        /// Dotted path
        path: String,

        /// Leaf value
        value: String,
    },

    /// Set a dotted path inside an existing document
    Graft {
        /// Path to the JSON document
        #[arg(short, long)]
        file: PathBuf,

        /// Dotted path
        path: String,

        /// Leaf value
        value: String,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), BridgeError> {
    let json_mode = cli.json_mode;
    let records = cli.records.as_deref();
    let namespace = cli.namespace.as_deref();

    match cli.command {
        Some(Commands::Server { host, port }) => {
            let session = load_session(records, namespace)?;
            cmd_server(session, &host, port).await
        }
        Some(Commands::Convert { file, snapshot }) => {
            cmd_convert(json_mode, &file, snapshot.as_deref())
        }
        Some(Commands::Inspect { file }) => cmd_inspect(json_mode, &file),
        Some(Commands::Inject { file }) => cmd_inject(json_mode, cli.verbose, &file),
        Some(Commands::Path { action }) => match action {
            PathCommand::Build { path, value } => cmd_path_build(&path, &value),
            PathCommand::Graft { file, path, value } => cmd_path_graft(&file, &path, &value),
        },
        Some(Commands::Coerce { value, kind }) => cmd_coerce(json_mode, &value, &kind),
        Some(Commands::Materialize { file }) => {
            let session = load_session(records, namespace)?;
            cmd_materialize(json_mode, session, &file)
        }
        Some(Commands::Cycle {
            file,
            kernel_url,
            timeout,
        }) => {
            let session = load_session(records, namespace)?;
            cmd_cycle(json_mode, session, &file, kernel_url.as_deref(), timeout).await
        }
        None => Cli::command()
            .print_help()
            .map_err(|e| BridgeError::IoError(e.to_string())),
    }
}
