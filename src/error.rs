// Envault — Top-level error types
//
// Aggregates errors from the store and env-file modules into a single
// error enum for the application boundary.

use thiserror::Error;

/// Top-level error type for all Envault operations.
#[derive(Debug, Error)]
pub enum EnvaultError {
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("{0}")]
    EnvFile(#[from] crate::env_file::EnvFileError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, EnvaultError>;
