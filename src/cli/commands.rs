// Envault — CLI Command Handlers
//
// Each function handles one CLI subcommand against the store. The `serve`
// command starts the MCP stdio server and shuts it down cleanly on
// SIGINT/SIGTERM so the store handle is always released.

use uuid::Uuid;

use crate::env_file;
use crate::error::EnvaultError;
use crate::mcp::EnvVaultServer;
use crate::store::{self, Database, SecretDraft, SecretStore, SqliteSecretStore, StoreError};

use super::Commands;

/// Execute the parsed CLI command.
pub async fn execute(command: Commands) -> Result<(), EnvaultError> {
    match command {
        Commands::Init => cmd_init(),
        Commands::Add {
            name,
            description,
            value,
        } => cmd_add(name, description, value),
        Commands::List => cmd_list(),
        Commands::Get { id, reveal } => cmd_get(id, reveal),
        Commands::Update {
            id,
            name,
            description,
            value,
        } => cmd_update(id, name, description, value),
        Commands::Delete { id } => cmd_delete(id),
        Commands::Search { query } => cmd_search(query),
        Commands::Write { path, keys } => cmd_write(keys, path),
        Commands::Serve => cmd_serve().await,
    }
}

// ─── Init ────────────────────────────────────────────────────────────────────

fn cmd_init() -> Result<(), EnvaultError> {
    let dir = store::data_dir();
    std::fs::create_dir_all(&dir)?;

    let path = store::db_path();
    let _db = Database::open(&path)?;

    println!("✓ Envault initialized successfully");
    println!("  Database: {}", path.display());
    println!();
    println!("Next: add a secret with `envault add --name <NAME> --value <value>`");

    Ok(())
}

// ─── Add ─────────────────────────────────────────────────────────────────────

fn cmd_add(name: String, description: Option<String>, value: String) -> Result<(), EnvaultError> {
    let db = open_db()?;
    let store = SqliteSecretStore::new(&db);

    let secret = store.create(SecretDraft::new(name, description, value))?;
    println!("✓ Secret stored");
    println!("  ID:   {}", secret.id);
    println!("  Name: {}", secret.name);

    Ok(())
}

// ─── List ────────────────────────────────────────────────────────────────────

fn cmd_list() -> Result<(), EnvaultError> {
    let db = open_db()?;
    let store = SqliteSecretStore::new(&db);

    let listing = store.list()?;

    if listing.is_empty() {
        println!("No secrets stored yet.");
        println!("Add one with: envault add --name <NAME> --value <value>");
        return Ok(());
    }

    println!("Stored secrets ({}):\n", listing.len());
    for metadata in &listing {
        println!(
            "  {} │ {:20} │ {}",
            metadata.id,
            metadata.name,
            metadata.description.as_deref().unwrap_or(""),
        );
    }

    Ok(())
}

// ─── Get ─────────────────────────────────────────────────────────────────────

fn cmd_get(id_str: String, reveal: bool) -> Result<(), EnvaultError> {
    let id = parse_id(&id_str)?;

    let db = open_db()?;
    let store = SqliteSecretStore::new(&db);

    match store.get(&id)? {
        Some(secret) => {
            println!("Secret details:\n");
            println!("  ID:          {}", secret.id);
            println!("  Name:        {}", secret.name);
            println!(
                "  Description: {}",
                secret.description.as_deref().unwrap_or("")
            );
            if reveal {
                println!("  Value:       {}", secret.value());
            } else {
                println!("  Value:       [REDACTED]  (use --reveal to show)");
            }
            println!("  Created:     {}", format_ts(secret.created_at));
            println!("  Updated:     {}", format_ts(secret.updated_at));
        }
        None => {
            println!("Secret not found: {}", id);
        }
    }

    Ok(())
}

// ─── Update ──────────────────────────────────────────────────────────────────

fn cmd_update(
    id_str: String,
    name: String,
    description: Option<String>,
    value: String,
) -> Result<(), EnvaultError> {
    let id = parse_id(&id_str)?;

    let db = open_db()?;
    let store = SqliteSecretStore::new(&db);

    let secret = store.update(&id, SecretDraft::new(name, description, value))?;
    println!("✓ Secret {} updated", secret.id);
    println!("  Name:    {}", secret.name);
    println!("  Updated: {}", format_ts(secret.updated_at));

    Ok(())
}

// ─── Delete ──────────────────────────────────────────────────────────────────

fn cmd_delete(id_str: String) -> Result<(), EnvaultError> {
    let id = parse_id(&id_str)?;

    let db = open_db()?;
    let store = SqliteSecretStore::new(&db);

    if store.delete(&id)? {
        println!("✓ Secret {} deleted", id);
    } else {
        println!("Secret not found: {}", id);
    }

    Ok(())
}

// ─── Search ──────────────────────────────────────────────────────────────────

fn cmd_search(query: String) -> Result<(), EnvaultError> {
    let db = open_db()?;
    let store = SqliteSecretStore::new(&db);

    let hits = store.search(&query)?;

    if hits.is_empty() {
        println!("No secrets match '{}'.", query);
        return Ok(());
    }

    println!("Matching secrets ({}):\n", hits.len());
    for hit in &hits {
        println!(
            "  {:20} │ {}",
            hit.name,
            hit.description.as_deref().unwrap_or(""),
        );
    }

    Ok(())
}

// ─── Write ───────────────────────────────────────────────────────────────────

fn cmd_write(keys: Vec<String>, path: String) -> Result<(), EnvaultError> {
    let db = open_db()?;
    let store = SqliteSecretStore::new(&db);

    let outcome = env_file::write_env(&store, &keys, &path)?;

    println!("✓ Wrote {} secret(s) to {}", outcome.written, path);
    if !outcome.missing.is_empty() {
        println!("  Missing (not found): {}", outcome.missing.join(", "));
    }

    Ok(())
}

// ─── Serve ───────────────────────────────────────────────────────────────────

async fn cmd_serve() -> Result<(), EnvaultError> {
    // The server must never run with no data behind it.
    let db = open_db()?;
    let db_path = store::db_path();

    tracing::info!(
        db = %db_path.display(),
        "Starting Envault MCP server (stdio transport)"
    );

    let server = EnvVaultServer::new(db);

    use rmcp::ServiceExt;
    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| EnvaultError::Other(format!("MCP server error: {}", e)))?;

    tokio::select! {
        result = service.waiting() => {
            result.map_err(|e| EnvaultError::Other(format!("MCP server error: {}", e)))?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received, closing store");
        }
    }

    Ok(())
}

/// Resolve on SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Open the database, requiring `envault init` to have run first.
fn open_db() -> Result<Database, EnvaultError> {
    let path = store::db_path();
    if !path.exists() {
        return Err(StoreError::NotInitialized.into());
    }
    Ok(Database::open(&path)?)
}

fn parse_id(id: &str) -> Result<Uuid, EnvaultError> {
    Uuid::parse_str(id).map_err(|e| EnvaultError::Other(format!("Invalid id: {}", e)))
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}
