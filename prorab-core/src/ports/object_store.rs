//! Object store port - blob storage with public download URLs

use async_trait::async_trait;

use crate::domain::result::Result;

/// Blob storage abstraction
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload bytes under `path` (write-once; an existing object is replaced)
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<()>;

    /// Public download URL of an uploaded object
    async fn download_url(&self, path: &str) -> Result<String>;
}
