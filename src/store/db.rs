// Envault — Database management
//
// Opens and initializes the SQLite database that backs the secret store,
// and resolves its platform-specific location. Encryption at rest is
// delegated to the storage engine / OS.

use std::path::PathBuf;

use rusqlite::Connection;

use super::StoreError;

/// Wrapper around the SQLite connection backing the store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &std::path::Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing only).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run schema migrations to create or update tables.
    /// `name` is UNIQUE so the env-write path's exact lookup is unambiguous.
    fn run_migrations(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS secrets (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                description TEXT,
                value       TEXT NOT NULL,
                created_at  INTEGER NOT NULL,
                updated_at  INTEGER NOT NULL
            );
            ",
        )?;

        tracing::debug!("Database migrations completed successfully");
        Ok(())
    }
}

/// Directory for Envault data files.
/// `ENVAULT_DATA_DIR` overrides the platform data dir.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ENVAULT_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let base = dirs_next::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("envault")
}

/// Path to the database file.
pub fn db_path() -> PathBuf {
    data_dir().join("envault.db")
}

// ─── Tests ───────────────────────────────────────────────────────────────────
