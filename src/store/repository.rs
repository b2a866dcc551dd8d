// Envault — Secret Store Repository
//
// Implements CRUD and search over the secrets database. Key design decision:
// `search()` is a projection query that never selects the value column, so
// its results cannot carry secret material. The raw value leaves the store
// only through `get()`/`find_exact()`, which are reserved for trusted
// callers and the env-write path.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use super::db::Database;
use super::models::{SearchHit, Secret, SecretDraft, SecretMetadata};
use super::StoreError;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over secret storage operations.
pub trait SecretStore {
    /// Create a new secret. Returns the stored record.
    fn create(&self, draft: SecretDraft) -> Result<Secret, StoreError>;

    /// Get a secret by id, including its value. Trusted callers only.
    fn get(&self, id: &Uuid) -> Result<Option<Secret>, StoreError>;

    /// Replace name/description/value of an existing secret.
    fn update(&self, id: &Uuid, draft: SecretDraft) -> Result<Secret, StoreError>;

    /// Delete a secret by id. Returns true if it existed.
    fn delete(&self, id: &Uuid) -> Result<bool, StoreError>;

    /// List all secrets (metadata only, no values), ordered by name.
    fn list(&self) -> Result<Vec<SecretMetadata>, StoreError>;

    /// Exact, case-sensitive lookup by name. Used by the env-write path.
    fn find_exact(&self, name: &str) -> Result<Option<Secret>, StoreError>;

    /// Case-insensitive substring search over name or description,
    /// ordered by name. Results carry name and description only.
    fn search(&self, query: &str) -> Result<Vec<SearchHit>, StoreError>;
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

pub struct SqliteSecretStore<'a> {
    db: &'a Database,
}

impl<'a> SqliteSecretStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Parse a full secret row from the database.
    fn row_to_secret(row: &rusqlite::Row<'_>) -> rusqlite::Result<Secret> {
        let id_str: String = row.get(0)?;
        let id = Uuid::parse_str(&id_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Secret::new(
            id,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    }

    /// Parse a metadata row (no value column in the query).
    fn row_to_metadata(row: &rusqlite::Row<'_>) -> rusqlite::Result<SecretMetadata> {
        let id_str: String = row.get(0)?;
        let id = Uuid::parse_str(&id_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(SecretMetadata {
            id,
            name: row.get(1)?,
            description: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
}

/// Reject drafts whose name is empty.
fn validate(draft: &SecretDraft) -> Result<(), StoreError> {
    if draft.name.is_empty() {
        return Err(StoreError::Validation(
            "secret name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Map a UNIQUE-constraint failure on `name` to `DuplicateName`.
fn map_name_conflict(name: &str, err: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(e, _) = &err {
        if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
            return StoreError::DuplicateName(name.to_string());
        }
    }
    StoreError::Database(err)
}

/// Escape SQL LIKE wildcards so the query string matches literally.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl<'a> SecretStore for SqliteSecretStore<'a> {
    fn create(&self, draft: SecretDraft) -> Result<Secret, StoreError> {
        validate(&draft)?;

        let id = Uuid::new_v4();
        let now = Utc::now().timestamp();

        self.db
            .conn()
            .execute(
                "INSERT INTO secrets (id, name, description, value, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id.to_string(),
                    draft.name,
                    draft.description,
                    draft.value,
                    now,
                    now,
                ],
            )
            .map_err(|e| map_name_conflict(&draft.name, e))?;

        tracing::info!(secret_id = %id, name = %draft.name, "Secret stored");

        Ok(Secret::new(
            id,
            draft.name,
            draft.description,
            draft.value,
            now,
            now,
        ))
    }

    fn get(&self, id: &Uuid) -> Result<Option<Secret>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT id, name, description, value, created_at, updated_at
             FROM secrets WHERE id = ?1",
        )?;

        let mut rows = stmt.query_map(params![id.to_string()], Self::row_to_secret)?;

        match rows.next() {
            Some(Ok(secret)) => Ok(Some(secret)),
            Some(Err(e)) => Err(StoreError::Database(e)),
            None => Ok(None),
        }
    }

    fn update(&self, id: &Uuid, draft: SecretDraft) -> Result<Secret, StoreError> {
        validate(&draft)?;

        let existing = self.get(id)?.ok_or(StoreError::NotFound(*id))?;

        // The clock has second resolution; keep updated_at strictly
        // increasing even when two updates land in the same second.
        let now = Utc::now().timestamp();
        let updated_at = if now > existing.updated_at {
            now
        } else {
            existing.updated_at + 1
        };

        self.db
            .conn()
            .execute(
                "UPDATE secrets SET name = ?1, description = ?2, value = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    draft.name,
                    draft.description,
                    draft.value,
                    updated_at,
                    id.to_string(),
                ],
            )
            .map_err(|e| map_name_conflict(&draft.name, e))?;

        tracing::info!(secret_id = %id, name = %draft.name, "Secret updated");

        Ok(Secret::new(
            *id,
            draft.name,
            draft.description,
            draft.value,
            existing.created_at,
            updated_at,
        ))
    }

    fn delete(&self, id: &Uuid) -> Result<bool, StoreError> {
        let affected = self
            .db
            .conn()
            .execute("DELETE FROM secrets WHERE id = ?1", params![id.to_string()])?;

        if affected > 0 {
            tracing::info!(secret_id = %id, "Secret deleted");
        }

        Ok(affected > 0)
    }

    fn list(&self) -> Result<Vec<SecretMetadata>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT id, name, description, created_at, updated_at
             FROM secrets ORDER BY name",
        )?;

        let rows = stmt.query_map([], Self::row_to_metadata)?;

        let mut metadata = Vec::new();
        for row in rows {
            metadata.push(row?);
        }

        Ok(metadata)
    }

    fn find_exact(&self, name: &str) -> Result<Option<Secret>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT id, name, description, value, created_at, updated_at
             FROM secrets WHERE name = ?1",
        )?;

        let mut rows = stmt.query_map(params![name], Self::row_to_secret)?;

        match rows.next() {
            Some(Ok(secret)) => Ok(Some(secret)),
            Some(Err(e)) => Err(StoreError::Database(e)),
            None => Ok(None),
        }
    }

    fn search(&self, query: &str) -> Result<Vec<SearchHit>, StoreError> {
        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));

        let mut stmt = self.db.conn().prepare(
            "SELECT name, description FROM secrets
             WHERE LOWER(name) LIKE ?1 ESCAPE '\\'
                OR LOWER(COALESCE(description, '')) LIKE ?1 ESCAPE '\\'
             ORDER BY name",
        )?;

        let rows = stmt.query_map(params![pattern], |row| {
            Ok(SearchHit {
                name: row.get(0)?,
                description: row.get(1)?,
            })
        })?;

        let mut hits = Vec::new();
        for row in rows {
            hits.push(row?);
        }

        Ok(hits)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_store() -> (Database, Uuid) {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteSecretStore::new(&db);

        let secret = store
            .create(SecretDraft::new(
                "API_KEY",
                Some("Key for the data API".to_string()),
                "sk-test1234567890",
            ))
            .unwrap();
        let id = secret.id;

        (db, id)
    }

    #[test]
    fn test_create_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteSecretStore::new(&db);

        let created = store
            .create(SecretDraft::new(
                "DB_PASSWORD",
                Some("Postgres password".to_string()),
                "hunter2",
            ))
            .unwrap();
        assert_eq!(created.created_at, created.updated_at);

        let fetched = store.get(&created.id).unwrap().expect("Secret should exist");
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.name, "DB_PASSWORD");
        assert_eq!(fetched.description.as_deref(), Some("Postgres password"));
        assert_eq!(fetched.value(), "hunter2");
        assert_eq!(fetched.created_at, created.created_at);
        assert_eq!(fetched.updated_at, created.created_at);
    }

    #[test]
    fn test_create_empty_name_rejected() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteSecretStore::new(&db);

        let result = store.create(SecretDraft::new("", None, "value"));
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_create_duplicate_name_rejected() {
        let (db, _id) = setup_store();
        let store = SqliteSecretStore::new(&db);

        let result = store.create(SecretDraft::new("API_KEY", None, "other"));
        assert!(matches!(result, Err(StoreError::DuplicateName(_))));
    }

    #[test]
    fn test_get_nonexistent_returns_none() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteSecretStore::new(&db);

        let result = store.get(&Uuid::new_v4()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_update_advances_updated_at_strictly() {
        let (db, id) = setup_store();
        let store = SqliteSecretStore::new(&db);

        let before = store.get(&id).unwrap().unwrap();
        let updated = store
            .update(
                &id,
                SecretDraft::new("API_KEY", Some("rotated".to_string()), "sk-new"),
            )
            .unwrap();

        assert_eq!(updated.id, id);
        assert_eq!(updated.created_at, before.created_at);
        assert!(
            updated.updated_at > before.updated_at,
            "updated_at must advance strictly"
        );
        assert_eq!(updated.value(), "sk-new");

        let fetched = store.get(&id).unwrap().unwrap();
        assert_eq!(fetched.value(), "sk-new");
        assert_eq!(fetched.updated_at, updated.updated_at);
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteSecretStore::new(&db);

        let result = store.update(&Uuid::new_v4(), SecretDraft::new("X", None, "v"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_update_empty_name_rejected() {
        let (db, id) = setup_store();
        let store = SqliteSecretStore::new(&db);

        let result = store.update(&id, SecretDraft::new("", None, "v"));
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_update_to_existing_name_rejected() {
        let (db, id) = setup_store();
        let store = SqliteSecretStore::new(&db);

        store
            .create(SecretDraft::new("OTHER_KEY", None, "v2"))
            .unwrap();

        let result = store.update(&id, SecretDraft::new("OTHER_KEY", None, "v3"));
        assert!(matches!(result, Err(StoreError::DuplicateName(_))));
    }

    #[test]
    fn test_delete_then_delete_again() {
        let (db, id) = setup_store();
        let store = SqliteSecretStore::new(&db);

        assert!(store.delete(&id).unwrap(), "First delete should return true");
        assert!(
            !store.delete(&id).unwrap(),
            "Second delete should return false"
        );
        assert!(store.get(&id).unwrap().is_none());
    }

    #[test]
    fn test_list_is_ordered_by_name_and_value_free() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteSecretStore::new(&db);

        for name in ["ZULU", "ALPHA", "MIKE"] {
            store
                .create(SecretDraft::new(name, None, format!("secret-{name}")))
                .unwrap();
        }

        let listing = store.list().unwrap();
        let names: Vec<&str> = listing.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["ALPHA", "MIKE", "ZULU"]);

        for metadata in &listing {
            let json = serde_json::to_string(metadata).unwrap();
            assert!(
                !json.contains("secret-"),
                "Listing must never contain secret values"
            );
        }
    }

    #[test]
    fn test_find_exact_is_case_sensitive() {
        let (db, _id) = setup_store();
        let store = SqliteSecretStore::new(&db);

        assert!(store.find_exact("API_KEY").unwrap().is_some());
        assert!(store.find_exact("api_key").unwrap().is_none());
        assert!(store.find_exact("API").unwrap().is_none());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let (db, _id) = setup_store();
        let store = SqliteSecretStore::new(&db);

        for query in ["api", "API", "aPi_"] {
            let hits = store.search(query).unwrap();
            assert_eq!(hits.len(), 1, "query {query:?} should match API_KEY");
            assert_eq!(hits[0].name, "API_KEY");
        }
    }

    #[test]
    fn test_search_matches_description() {
        let (db, _id) = setup_store();
        let store = SqliteSecretStore::new(&db);

        let hits = store.search("data api").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].description.as_deref(), Some("Key for the data API"));
    }

    #[test]
    fn test_search_empty_query_matches_everything() {
        let (db, _id) = setup_store();
        let store = SqliteSecretStore::new(&db);

        store
            .create(SecretDraft::new("SECOND", None, "v"))
            .unwrap();

        let hits = store.search("").unwrap();
        assert_eq!(hits.len(), 2);
        // Ordered by name ascending
        assert_eq!(hits[0].name, "API_KEY");
        assert_eq!(hits[1].name, "SECOND");
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let (db, _id) = setup_store();
        let store = SqliteSecretStore::new(&db);

        assert!(store.search("%").unwrap().is_empty());
        assert!(store.search("A_I").unwrap().is_empty());
        // The literal underscore in API_KEY still matches
        assert_eq!(store.search("API_").unwrap().len(), 1);
    }

    #[test]
    fn test_search_results_never_contain_values() {
        let (db, _id) = setup_store();
        let store = SqliteSecretStore::new(&db);

        for query in ["", "api", "sk-test"] {
            let hits = store.search(query).unwrap();
            let json = serde_json::to_string(&hits).unwrap();
            assert!(
                !json.contains("sk-test"),
                "Search results must never contain values (query {query:?})"
            );
        }
    }

    #[test]
    fn test_search_absent_description_treated_as_empty() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteSecretStore::new(&db);

        store.create(SecretDraft::new("NO_DESC", None, "v")).unwrap();

        // Matching on the name still works when description is NULL
        let hits = store.search("no_desc").unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].description.is_none());
    }
}
