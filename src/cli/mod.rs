// Envault — CLI Module
//
// Command-line interface using clap derive macros. This is the trusted
// surface: it may read and replace secret values. The agent-facing surface
// is the MCP server started by `serve`.

mod commands;

use clap::{Parser, Subcommand};

pub use commands::execute;

/// Envault — a local secret vault that fills .env files for AI agents
/// without ever showing them a value.
#[derive(Parser, Debug)]
#[command(name = "envault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Envault: create the data directory and database.
    Init,

    /// Add a new secret to the vault.
    Add {
        /// The .env variable name the secret will be written under
        /// (e.g. "API_KEY"). Must be unique.
        #[arg(long)]
        name: String,

        /// Human-readable description, searchable by the agent.
        #[arg(long)]
        description: Option<String>,

        /// The secret value.
        /// For production use, prefer reading from a file or prompt to avoid
        /// shell history exposure.
        #[arg(long)]
        value: String,
    },

    /// List all stored secrets (metadata only, no values).
    List,

    /// Show a secret by id. The value stays redacted unless --reveal is set.
    Get {
        /// The UUID of the secret.
        id: String,

        /// Print the raw value instead of [REDACTED].
        #[arg(long)]
        reveal: bool,
    },

    /// Replace the name, description, and value of an existing secret.
    Update {
        /// The UUID of the secret to update.
        id: String,

        /// The new name.
        #[arg(long)]
        name: String,

        /// The new description (omit to clear).
        #[arg(long)]
        description: Option<String>,

        /// The new value.
        #[arg(long)]
        value: String,
    },

    /// Delete a secret by id.
    Delete {
        /// The UUID of the secret to delete.
        id: String,
    },

    /// Search secrets by name or description (case-insensitive substring).
    Search {
        /// The query; an empty string matches everything.
        query: String,
    },

    /// Write the named secrets to a .env file.
    Write {
        /// Absolute path of the .env file to create or overwrite.
        #[arg(long)]
        path: String,

        /// Secret names, in the order the lines should appear.
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Start the MCP server (stdio transport) for AI assistants.
    Serve,
}
