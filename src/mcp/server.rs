// Envault — MCP Server Implementation
//
// Uses the rmcp crate (official Rust MCP SDK) to expose exactly two tools
// to the agent: search_secrets and write_env. Search responses are built
// from the store's value-free projection; write_env reports only the
// written count and missing names. Failures inside a dispatched tool are
// returned as error-flagged results, never as a crash.

use std::sync::{Arc, Mutex};

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::schemars;
use rmcp::{tool, tool_handler, tool_router};
use rmcp::{ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};

use crate::env_file;
use crate::store::{Database, SecretStore, SqliteSecretStore, StoreError};

// ─── Tool Parameter Types ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct SearchSecretsParams {
    /// Substring to match against secret names and descriptions
    /// (case-insensitive; an empty query matches everything)
    pub query: String,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct WriteEnvParams {
    /// Secret names to write, in the order the lines should appear
    pub keys: Vec<String>,
    /// Absolute path of the .env file to create or overwrite
    pub path: String,
}

// ─── Server State ────────────────────────────────────────────────────────────

/// The MCP server that exposes the Envault tools.
///
/// Owns the store handle for the process lifetime. The mutex makes the
/// handle shareable with the async runtime; it is never held across an
/// await point, so requests are served strictly one at a time.
#[derive(Clone)]
pub struct EnvVaultServer {
    db: Arc<Mutex<Database>>,
    tool_router: ToolRouter<Self>,
}

impl EnvVaultServer {
    /// Create a new MCP server over an already-opened database.
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            tool_router: Self::tool_router(),
        }
    }

    /// Run a closure against the store under the handle lock.
    fn with_store<T, E>(
        &self,
        f: impl FnOnce(&SqliteSecretStore<'_>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let db = self
            .db
            .lock()
            .map_err(|_| StoreError::Other("store handle lock poisoned".to_string()))?;
        let store = SqliteSecretStore::new(&db);
        f(&store)
    }
}

// ─── Tool Definitions ────────────────────────────────────────────────────────

#[tool_router]
impl EnvVaultServer {
    /// Search secrets by name or description. Metadata only — never values.
    #[tool(
        description = "Search stored secrets by name or description \
                       (case-insensitive substring). Returns names and \
                       descriptions only, never secret values."
    )]
    async fn search_secrets(
        &self,
        params: Parameters<SearchSecretsParams>,
    ) -> Result<CallToolResult, McpError> {
        let searched: Result<_, StoreError> =
            self.with_store(|store| store.search(&params.0.query));
        let hits = match searched {
            Ok(hits) => hits,
            Err(e) => {
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Search failed: {}",
                    e
                ))]));
            }
        };

        let json = serde_json::to_string_pretty(&hits).map_err(|e| {
            McpError::internal_error(format!("Serialization error: {}", e), None)
        })?;

        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    /// Resolve secret names and write them straight to a .env file.
    #[tool(
        description = "Write the named secrets to a .env file at an absolute \
                       path. The file is created with owner-only permissions. \
                       The response reports only how many secrets were written \
                       and which names were not found."
    )]
    async fn write_env(
        &self,
        params: Parameters<WriteEnvParams>,
    ) -> Result<CallToolResult, McpError> {
        let WriteEnvParams { keys, path } = params.0;

        match self.with_store(|store| env_file::write_env(store, &keys, &path)) {
            Ok(outcome) => {
                let mut text = format!(
                    "Successfully wrote {} secret(s) to {}",
                    outcome.written, path
                );
                if !outcome.missing.is_empty() {
                    text.push_str(&format!(
                        "\nMissing secrets (not found): {}",
                        outcome.missing.join(", ")
                    ));
                }
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }
}

// ─── ServerHandler ───────────────────────────────────────────────────────────

#[tool_handler]
impl ServerHandler for EnvVaultServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Envault — local secret vault. Search stored secret names and \
                 descriptions, and write secrets directly into .env files. \
                 Secret values are never returned through this interface."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
