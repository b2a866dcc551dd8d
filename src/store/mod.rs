// Envault — Store Module
//
// SQLite-backed secret storage. Values leave the store only through the
// trusted get/find_exact paths; search and list are value-free projections.

mod db;
mod error;
mod models;
mod repository;

pub use db::{data_dir, db_path, Database};
pub use error::StoreError;
pub use models::{SearchHit, Secret, SecretDraft, SecretMetadata};
pub use repository::{SecretStore, SqliteSecretStore};
