//! In-memory adapters for tests and dry runs
//!
//! `MemoryDocumentStore` follows the same query and batch rules as the DuckDB
//! store and can be told to fail specific operations, which is how the
//! partial-failure paths of the client workflows are exercised.
//! `MemoryObjectStore` and `RecordingAlert` stand in for blob storage and the
//! user's alert dialog.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::ports::{
    ContractArchive, Document, DocumentStore, Fields, ObjectStore, Query, UserAlert, WriteBatch,
    WriteOp,
};

/// Store operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Get,
    Query,
    Add,
    Set,
    Update,
    Delete,
    Commit,
}

type Collections = BTreeMap<String, BTreeMap<String, Fields>>;

/// Document store kept in a map
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<Collections>,
    failing: Mutex<HashSet<StoreOperation>>,
    calls: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call of `op` fail until [`Self::recover`]
    pub fn fail(&self, op: StoreOperation) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(op);
        }
    }

    pub fn recover(&self) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.clear();
        }
    }

    /// Number of store calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Ids of all documents in a collection
    pub fn ids(&self, collection: &str) -> Vec<String> {
        self.collections
            .lock()
            .map(|c| {
                c.get(collection)
                    .map(|docs| docs.keys().cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    fn enter(&self, op: StoreOperation) -> Result<std::sync::MutexGuard<'_, Collections>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))?;
        if failing.contains(&op) {
            return Err(Error::database(format!("injected {:?} failure", op)));
        }
        drop(failing);
        self.collections
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }
}

fn apply_op(collections: &mut Collections, op: &WriteOp) -> Result<()> {
    match op {
        WriteOp::Delete { collection, id } => {
            if let Some(docs) = collections.get_mut(collection) {
                docs.remove(id);
            }
            Ok(())
        }
        WriteOp::Update {
            collection,
            id,
            fields,
        } => {
            let doc = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| Error::not_found(format!("{}/{}", collection, id)))?;
            for (key, value) in fields {
                doc.insert(key.clone(), value.clone());
            }
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.enter(StoreOperation::Get)?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id, data.clone())))
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>> {
        let collections = self.enter(StoreOperation::Query)?;
        let docs = collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document::new(id.clone(), data.clone()))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(query.apply(docs))
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String> {
        let mut collections = self.enter(StoreOperation::Add)?;
        let id = Uuid::new_v4().to_string();
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let mut collections = self.enter(StoreOperation::Set)?;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let mut collections = self.enter(StoreOperation::Update)?;
        apply_op(
            &mut collections,
            &WriteOp::Update {
                collection: collection.to_string(),
                id: id.to_string(),
                fields,
            },
        )
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut collections = self.enter(StoreOperation::Delete)?;
        apply_op(
            &mut collections,
            &WriteOp::Delete {
                collection: collection.to_string(),
                id: id.to_string(),
            },
        )
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut collections = self.enter(StoreOperation::Commit)?;
        // Stage on a copy so a failing write leaves nothing applied
        let mut staged = collections.clone();
        for op in batch.ops() {
            apply_op(&mut staged, op)?;
        }
        *collections = staged;
        Ok(())
    }
}

/// Object store kept in a map, serving `memory://` URLs
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<String, (Vec<u8>, String)>>,
    uploads: AtomicUsize,
    fail_uploads: std::sync::atomic::AtomicBool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of upload attempts (failed ones included)
    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_uploads.store(failing, Ordering::SeqCst);
    }

    pub fn paths(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Stored bytes and content type of `path`
    pub fn object(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.objects.lock().ok()?.get(path).cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(Error::storage("quota exceeded"));
        }
        let mut objects = self
            .objects
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?;
        objects.insert(path.to_string(), (bytes.to_vec(), content_type.to_string()));
        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String> {
        let objects = self
            .objects
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?;
        if objects.contains_key(path) {
            Ok(format!("memory://{}", path))
        } else {
            Err(Error::not_found(path.to_string()))
        }
    }
}

/// Alert sink that remembers every message
#[derive(Default)]
pub struct RecordingAlert {
    messages: Mutex<Vec<String>>,
}

impl RecordingAlert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl UserAlert for RecordingAlert {
    fn alert(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

/// Contract archive that only records which clients it was asked about
#[derive(Default)]
pub struct RecordingContractArchive {
    deleted: Mutex<Vec<String>>,
    failing: std::sync::atomic::AtomicBool,
}

impl RecordingContractArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ContractArchive for RecordingContractArchive {
    async fn delete_client_contracts(&self, client_id: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::database("contract archive unavailable"));
        }
        let mut deleted = self
            .deleted
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))?;
        deleted.push(client_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::document_store::fields;
    use serde_json::json;

    #[tokio::test]
    async fn test_injected_failure_and_recovery() {
        let store = MemoryDocumentStore::new();
        store.fail(StoreOperation::Query);
        assert!(store.query(&Query::collection("clients")).await.is_err());

        store.recover();
        assert!(store.query(&Query::collection("clients")).await.unwrap().is_empty());
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_batch_is_all_or_nothing() {
        let store = MemoryDocumentStore::new();
        store
            .set("clients", "c1", fields([("firstName", json!("Petr"))]))
            .await
            .unwrap();

        let mut batch = WriteBatch::new();
        batch
            .delete("clients", "c1")
            .update("categories", "missing", fields([("isVisible", json!(true))]));
        assert!(store.commit(batch).await.is_err());
        assert_eq!(store.ids("clients"), vec!["c1".to_string()]);
    }

    #[tokio::test]
    async fn test_object_store_urls() {
        let objects = MemoryObjectStore::new();
        objects
            .upload("product-images/1-a.png", b"png", "image/png")
            .await
            .unwrap();
        assert_eq!(
            objects.download_url("product-images/1-a.png").await.unwrap(),
            "memory://product-images/1-a.png"
        );
        assert!(objects.download_url("product-images/none.png").await.is_err());
    }
}
