//! DuckDB document store implementation
//!
//! Every document is one row of the `documents` table: its collection, its id
//! and its fields as a JSON object. Filtering and ordering happen in Rust with
//! the same rules the in-memory store uses.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use duckdb::{params, Connection};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::ports::{Document, DocumentStore, Fields, Query, WriteBatch, WriteOp};
use crate::services::MigrationService;

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// DuckDB-backed document store
pub struct DuckDbDocumentStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbDocumentStore {
    /// Open (or create) the document database
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which occur when the CLI and another process open the file together.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[prorab] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::database(format!("Failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    /// In-memory database, used by tests and demo seeding
    pub fn open_in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Extension autoloading stays off; JSON is linked in via the "json" feature
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        MigrationService::new(&conn)
            .run_pending()
            .map_err(|e| Error::database(e.to_string()))?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> Result<i64> {
        let conn = self.lock()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?",
            [collection],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn load_collection(conn: &Connection, collection: &str) -> Result<Vec<Document>> {
        let mut stmt =
            conn.prepare("SELECT id, CAST(data AS VARCHAR) FROM documents WHERE collection = ?")?;
        let rows = stmt.query_map([collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, raw) = row?;
            docs.push(Document::new(id, parse_fields(&raw)?));
        }
        Ok(docs)
    }

    fn load_one(conn: &Connection, collection: &str, id: &str) -> Result<Option<Document>> {
        let result = conn.query_row(
            "SELECT CAST(data AS VARCHAR) FROM documents WHERE collection = ? AND id = ?",
            params![collection, id],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(raw) => Ok(Some(Document::new(id, parse_fields(&raw)?))),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn upsert(conn: &Connection, collection: &str, id: &str, fields: &Fields) -> Result<()> {
        let data = serde_json::to_string(fields)?;
        conn.execute(
            "INSERT INTO documents (collection, id, data, updated_at)
             VALUES (?, ?, ?, current_timestamp)
             ON CONFLICT (collection, id) DO UPDATE
             SET data = EXCLUDED.data, updated_at = EXCLUDED.updated_at",
            params![collection, id, data],
        )?;
        Ok(())
    }

    fn merge(conn: &Connection, collection: &str, id: &str, fields: &Fields) -> Result<()> {
        let mut doc = Self::load_one(conn, collection, id)?
            .ok_or_else(|| Error::not_found(format!("{}/{}", collection, id)))?;
        for (key, value) in fields {
            doc.data.insert(key.clone(), value.clone());
        }
        let data = serde_json::to_string(&doc.data)?;
        conn.execute(
            "UPDATE documents SET data = ?, updated_at = current_timestamp
             WHERE collection = ? AND id = ?",
            params![data, collection, id],
        )?;
        Ok(())
    }

    fn remove(conn: &Connection, collection: &str, id: &str) -> Result<()> {
        conn.execute(
            "DELETE FROM documents WHERE collection = ? AND id = ?",
            params![collection, id],
        )?;
        Ok(())
    }
}

fn parse_fields(raw: &str) -> Result<Fields> {
    match serde_json::from_str::<JsonValue>(raw)? {
        JsonValue::Object(map) => Ok(map),
        other => Err(Error::database(format!("document is not an object: {}", other))),
    }
}

#[async_trait]
impl DocumentStore for DuckDbDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let conn = self.lock()?;
        Self::load_one(&conn, collection, id)
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>> {
        let conn = self.lock()?;
        let docs = Self::load_collection(&conn, &query.collection)?;
        Ok(query.apply(docs))
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let conn = self.lock()?;
        Self::upsert(&conn, collection, &id, &fields)?;
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let conn = self.lock()?;
        Self::upsert(&conn, collection, id, &fields)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let conn = self.lock()?;
        Self::merge(&conn, collection, id, &fields)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let conn = self.lock()?;
        Self::remove(&conn, collection, id)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for op in batch.ops() {
            match op {
                WriteOp::Delete { collection, id } => Self::remove(&tx, collection, id)?,
                WriteOp::Update {
                    collection,
                    id,
                    fields,
                } => Self::merge(&tx, collection, id, fields)?,
            }
        }
        // Dropping an uncommitted transaction rolls it back
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::document_store::fields;
    use serde_json::json;

    fn store() -> DuckDbDocumentStore {
        let store = DuckDbDocumentStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store
    }

    fn obj(value: JsonValue) -> Fields {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_retryable_error_detection() {
        assert!(is_retryable_error(
            "The process cannot access the file because it is being used by another process"
        ));
        assert!(is_retryable_error("IO Error: database is locked"));
        assert!(!is_retryable_error("Permission denied"));
    }

    #[tokio::test]
    async fn test_set_get_update_delete() {
        let store = store();
        store
            .set("clients", "c1", obj(json!({"firstName": "Petr", "year": 2024})))
            .await
            .unwrap();

        store
            .update("clients", "c1", fields([("status", json!("built"))]))
            .await
            .unwrap();
        let doc = store.get("clients", "c1").await.unwrap().unwrap();
        assert_eq!(doc.get("firstName"), Some(&json!("Petr")));
        assert_eq!(doc.get("status"), Some(&json!("built")));

        store.delete("clients", "c1").await.unwrap();
        assert!(store.get("clients", "c1").await.unwrap().is_none());
        // Deleting again is a no-op
        store.delete("clients", "c1").await.unwrap();
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let store = store();
        let err = store
            .update("clients", "ghost", fields([("status", json!("built"))]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_query_with_filters_and_order() {
        let store = store();
        for (id, number, year) in [("a", 3, 2024), ("b", 1, 2024), ("c", 2, 2025)] {
            store
                .set(
                    "clients",
                    id,
                    obj(json!({"clientNumber": number, "year": year})),
                )
                .await
                .unwrap();
        }
        store
            .set("categories", "x", obj(json!({"year": 2024})))
            .await
            .unwrap();

        let docs = store
            .query(&Query::collection("clients").where_eq("year", 2024).order_by("clientNumber"))
            .await
            .unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_failed_batch_rolls_back() {
        let store = store();
        store
            .set("clients", "c1", obj(json!({"firstName": "Petr"})))
            .await
            .unwrap();

        let mut batch = WriteBatch::new();
        batch
            .delete("clients", "c1")
            .update("categories", "missing", fields([("isVisible", json!(false))]));

        assert!(store.commit(batch).await.is_err());
        assert!(store.get("clients", "c1").await.unwrap().is_some());
        assert_eq!(store.count("clients").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_add_generates_ids() {
        let store = store();
        let a = store.add("notifications", obj(json!({"title": "a"}))).await.unwrap();
        let b = store.add("notifications", obj(json!({"title": "b"}))).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.count("notifications").unwrap(), 2);
    }
}
