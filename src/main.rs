// Envault — Application Entry Point
//
// Parses CLI arguments, initializes structured logging (which never emits
// secret values), and dispatches to the command handler. Uses the tokio
// async runtime for MCP server support.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use envault::cli::{execute, Cli};

#[tokio::main]
async fn main() {
    // Initialize tracing with env filter (RUST_LOG=envault=debug for verbose
    // output). The default level is `info`, which never includes values.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("envault=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = execute(cli.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
