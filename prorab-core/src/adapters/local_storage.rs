//! Local filesystem object store
//!
//! Objects are written below a root directory. Public URLs are either
//! `file://` URLs or, when a public base URL is configured (a static file
//! server in front of the directory), that base joined with the object path.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use url::Url;

use crate::domain::result::{Error, Result};
use crate::ports::ObjectStore;

pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: Option<Url>,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_base_url: None,
        }
    }

    /// Serve objects from `base` instead of `file://` URLs
    pub fn with_public_base_url(mut self, base: &str) -> Result<Self> {
        let mut url = Url::parse(base)
            .map_err(|e| Error::Config(format!("Invalid public base URL '{}': {}", base, e)))?;
        // Url::join replaces the last segment unless the base ends with a slash
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.public_base_url = Some(url);
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an object path below the root, refusing escapes
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if path.is_empty() || escapes {
            return Err(Error::validation(format!("Invalid object path: {}", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(&self, path: &str, bytes: &[u8], _content_type: &str) -> Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String> {
        let target = self.resolve(path)?;
        if !tokio::fs::try_exists(&target).await? {
            return Err(Error::not_found(path.to_string()));
        }

        if let Some(base) = &self.public_base_url {
            let url = base
                .join(path)
                .map_err(|e| Error::storage(format!("Cannot build URL for {}: {}", path, e)))?;
            return Ok(url.to_string());
        }

        let absolute = std::path::absolute(&target)?;
        Url::from_file_path(&absolute)
            .map(|u| u.to_string())
            .map_err(|_| Error::storage(format!("Cannot build URL for {}", absolute.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_upload_and_file_url() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store
            .upload("product-images/1700000000000-brick.png", b"png", "image/png")
            .await
            .unwrap();

        assert!(dir
            .path()
            .join("product-images/1700000000000-brick.png")
            .exists());
        let url = store
            .download_url("product-images/1700000000000-brick.png")
            .await
            .unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("product-images/1700000000000-brick.png"));
    }

    #[tokio::test]
    async fn test_public_base_url() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path())
            .with_public_base_url("https://cdn.example.com/media")
            .unwrap();

        store
            .upload("product-images/1-my photo.jpg", b"jpg", "image/jpeg")
            .await
            .unwrap();
        let url = store.download_url("product-images/1-my photo.jpg").await.unwrap();
        assert_eq!(
            url,
            "https://cdn.example.com/media/product-images/1-my%20photo.jpg"
        );
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        assert!(store.upload("../outside.png", b"x", "image/png").await.is_err());
        assert!(store.upload("/etc/passwd", b"x", "text/plain").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_object_has_no_url() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        assert!(matches!(
            store.download_url("product-images/none.png").await,
            Err(Error::NotFound(_))
        ));
    }
}
