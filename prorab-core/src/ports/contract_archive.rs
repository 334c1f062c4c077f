//! Contract archive port
//!
//! Client contracts live outside the client directory. The only operation the
//! directory needs is removing all contracts of a client it deletes.

use async_trait::async_trait;

use crate::domain::result::Result;

#[async_trait]
pub trait ContractArchive: Send + Sync {
    /// Delete every contract of a client. Deleting nothing is not an error.
    async fn delete_client_contracts(&self, client_id: &str) -> Result<()>;
}
