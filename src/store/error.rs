// Envault — Store error types

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Secret not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid secret: {0}")]
    Validation(String),

    #[error("A secret named '{0}' already exists")]
    DuplicateName(String),

    #[error("Store is not initialized — run `envault init` first")]
    NotInitialized,

    #[error("{0}")]
    Other(String),
}
