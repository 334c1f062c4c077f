//! Contract archive backed by the document store
//!
//! Contracts are documents of the `contracts` collection that reference their
//! client through `clientId`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::ports::{collections, ContractArchive, DocumentStore, Query, WriteBatch};

pub struct StoreContractArchive {
    store: Arc<dyn DocumentStore>,
}

impl StoreContractArchive {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ContractArchive for StoreContractArchive {
    async fn delete_client_contracts(&self, client_id: &str) -> Result<()> {
        let contracts = self
            .store
            .query(&Query::collection(collections::CONTRACTS).where_eq("clientId", client_id))
            .await?;

        let mut batch = WriteBatch::new();
        for contract in &contracts {
            batch.delete(collections::CONTRACTS, &contract.id);
        }
        self.store.commit(batch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryDocumentStore;
    use crate::ports::document_store::fields;
    use serde_json::json;

    #[tokio::test]
    async fn test_deletes_only_the_clients_contracts() {
        let store = Arc::new(MemoryDocumentStore::new());
        for (id, client) in [("k1", "c1"), ("k2", "c1"), ("k3", "c2")] {
            store
                .set("contracts", id, fields([("clientId", json!(client))]))
                .await
                .unwrap();
        }

        let archive = StoreContractArchive::new(store.clone());
        archive.delete_client_contracts("c1").await.unwrap();

        assert_eq!(store.ids("contracts"), vec!["k3".to_string()]);
    }
}
