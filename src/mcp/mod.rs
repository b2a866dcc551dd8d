// Envault — MCP Server Module
//
// Exposes the two agent-facing tools (search_secrets, write_env) that AI
// assistants can discover and call via stdio transport.

mod server;

pub use server::EnvVaultServer;
