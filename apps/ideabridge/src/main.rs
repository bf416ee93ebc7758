//! # ideabridge
//!
//! The main binary for the ideabridge symbolic state bridge.
//!
//! This application provides:
//! - HTTP REST API server (axum-based) over one working-memory session
//! - CLI interface for conversions between JSON, trees and kernel edges
//! - A client for running one cycle against a remote kernel
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  apps/ideabridge (THE BINARY)                   │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐   │
//! │  │   CLI       │    │   HTTP API  │    │  Kernel Client   │   │
//! │  │  (clap)     │    │   (axum)    │    │  (reqwest)       │   │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘   │
//! │         │                  │                    │              │
//! │         └──────────────────┼────────────────────┘              │
//! │                            ▼                                   │
//! │                  ┌───────────────────┐                         │
//! │                  │  ideabridge-core  │                         │
//! │                  │   (THE ENGINE)    │                         │
//! │                  └───────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! ideabridge server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! ideabridge convert -f state.json
//! ideabridge inject -f state.json
//! ideabridge --records records.toml materialize -f output.json
//! ```

use clap::Parser;
use ideabridge::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // IDEABRIDGE_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("IDEABRIDGE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ideabridge=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  ideabridge v{}

  JSON • Ideas • Working Memory • Records
"#,
        env!("CARGO_PKG_VERSION")
    );
}
