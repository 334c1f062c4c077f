//! Image upload - product pictures dropped onto the warehouse screen

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::ports::{ObjectStore, UserAlert};
use crate::services::alerts;
use crate::services::logging::{now_ms, record, LogEvent, Logger};

/// Object path prefix of product images
pub const IMAGE_PREFIX: &str = "product-images";

/// Accepted file extensions (lowercase)
pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "webp"];

/// A file handed over by the user
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    size: u64,
    content: Content,
}

#[derive(Debug, Clone, PartialEq)]
enum Content {
    Bytes(Vec<u8>),
    /// Read only when the file is uploaded
    Path(PathBuf),
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            content: Content::Bytes(bytes),
        }
    }

    /// A file on disk; its size comes from the metadata
    pub async fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::validation(format!("not a file: {}", path.display())))?;
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(Error::validation(format!("not a file: {}", path.display())));
        }
        Ok(Self {
            name: name.to_string(),
            size: metadata.len(),
            content: Content::Path(path.to_path_buf()),
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    async fn bytes(&self) -> Result<Cow<'_, [u8]>> {
        match &self.content {
            Content::Bytes(bytes) => Ok(Cow::Borrowed(bytes.as_slice())),
            Content::Path(path) => Ok(Cow::Owned(tokio::fs::read(path).await?)),
        }
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    TooLarge { size: u64, max: u64 },
    UnsupportedType { extension: Option<String> },
}

impl UploadRejection {
    pub fn alert(&self) -> &'static str {
        match self {
            Self::TooLarge { .. } => alerts::FILE_TOO_LARGE,
            Self::UnsupportedType { .. } => alerts::UNSUPPORTED_IMAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Nothing was dropped
    Empty,
    Rejected(UploadRejection),
    /// Stored; carries the public URL
    Uploaded(String),
    Failed(String),
}

/// Check size and type before anything leaves the machine
pub fn validate(file: &UploadFile, max_bytes: u64) -> std::result::Result<(), UploadRejection> {
    if file.size() > max_bytes {
        return Err(UploadRejection::TooLarge {
            size: file.size(),
            max: max_bytes,
        });
    }
    match file.extension() {
        Some(ext) if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        extension => Err(UploadRejection::UnsupportedType { extension }),
    }
}

pub fn content_type(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

/// `product-images/<unix-millis>-<name>`
pub fn object_path(timestamp_ms: i64, name: &str) -> String {
    format!("{}/{}-{}", IMAGE_PREFIX, timestamp_ms, name)
}

pub struct ImageUploadService {
    objects: Arc<dyn ObjectStore>,
    alerts: Arc<dyn UserAlert>,
    max_bytes: u64,
    logger: Logger,
}

impl ImageUploadService {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        alerts: Arc<dyn UserAlert>,
        max_bytes: u64,
        logger: Logger,
    ) -> Self {
        Self {
            objects,
            alerts,
            max_bytes,
            logger,
        }
    }

    /// Upload the first dropped file and hand its URL to `on_uploaded`
    pub async fn handle_drop<F>(&self, files: Vec<UploadFile>, on_uploaded: F) -> UploadOutcome
    where
        F: FnOnce(&str),
    {
        let Some(file) = files.into_iter().next() else {
            return UploadOutcome::Empty;
        };

        if let Err(rejection) = validate(&file, self.max_bytes) {
            self.alerts.alert(rejection.alert());
            return UploadOutcome::Rejected(rejection);
        }

        match self.upload(&file).await {
            Ok(url) => {
                on_uploaded(&url);
                UploadOutcome::Uploaded(url)
            }
            Err(e) => {
                record(
                    &self.logger,
                    LogEvent::new("image_upload_failed").with_error(e.to_string()),
                );
                self.alerts.alert(alerts::UPLOAD_FAILED);
                UploadOutcome::Failed(e.to_string())
            }
        }
    }

    async fn upload(&self, file: &UploadFile) -> Result<String> {
        let path = object_path(now_ms(), &file.name);
        let extension = file.extension().unwrap_or_default();
        let bytes = file.bytes().await?;
        self.objects
            .upload(&path, &bytes, content_type(&extension))
            .await?;
        self.objects.download_url(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryObjectStore, RecordingAlert};
    use crate::config::DEFAULT_MAX_UPLOAD_BYTES;

    fn service() -> (ImageUploadService, Arc<MemoryObjectStore>, Arc<RecordingAlert>) {
        let objects = Arc::new(MemoryObjectStore::new());
        let alerts = Arc::new(RecordingAlert::new());
        let service = ImageUploadService::new(
            objects.clone(),
            alerts.clone(),
            DEFAULT_MAX_UPLOAD_BYTES,
            None,
        );
        (service, objects, alerts)
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let file = UploadFile::new("Фото.JPG", vec![1]);
        assert!(validate(&file, 10).is_ok());

        let file = UploadFile::new("scan.pdf", vec![1]);
        assert_eq!(
            validate(&file, 10),
            Err(UploadRejection::UnsupportedType {
                extension: Some("pdf".to_string())
            })
        );

        let file = UploadFile::new("noext", vec![1]);
        assert!(validate(&file, 10).is_err());
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let file = UploadFile::new("a.png", vec![0; 10]);
        assert!(validate(&file, 10).is_ok());
        assert!(matches!(
            validate(&file, 9),
            Err(UploadRejection::TooLarge { size: 10, max: 9 })
        ));
    }

    #[tokio::test]
    async fn test_empty_drop() {
        let (service, objects, recorded) = service();
        let outcome = service.handle_drop(Vec::new(), |_| panic!("no upload")).await;
        assert_eq!(outcome, UploadOutcome::Empty);
        assert_eq!(objects.uploads(), 0);
        assert!(recorded.messages().is_empty());
    }

    #[tokio::test]
    async fn test_only_first_file_is_uploaded() {
        let (service, objects, _alerts) = service();
        let mut received = None;
        let files = vec![
            UploadFile::new("first.webp", vec![1, 2, 3]),
            UploadFile::new("second.png", vec![4]),
        ];

        let outcome = service
            .handle_drop(files, |url| received = Some(url.to_string()))
            .await;

        assert!(matches!(outcome, UploadOutcome::Uploaded(_)));
        assert_eq!(objects.uploads(), 1);
        let paths = objects.paths();
        assert!(paths[0].starts_with("product-images/"));
        assert!(paths[0].ends_with("-first.webp"));
        assert!(received.is_some());
    }

    #[tokio::test]
    async fn test_oversized_file_on_disk_is_never_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facade.png");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(DEFAULT_MAX_UPLOAD_BYTES + 1).unwrap();

        let upload = UploadFile::from_path(&path).await.unwrap();
        assert_eq!(upload.size(), DEFAULT_MAX_UPLOAD_BYTES + 1);
        // Rejection must not need the content
        std::fs::remove_file(&path).unwrap();

        let (service, objects, recorded) = service();
        let outcome = service.handle_drop(vec![upload], |_| panic!("no upload")).await;
        assert!(matches!(
            outcome,
            UploadOutcome::Rejected(UploadRejection::TooLarge { .. })
        ));
        assert_eq!(objects.uploads(), 0);
        assert_eq!(recorded.messages(), vec![alerts::FILE_TOO_LARGE]);
    }

    #[tokio::test]
    async fn test_file_on_disk_is_read_on_upload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.webp");
        std::fs::write(&path, [5u8; 16]).unwrap();

        let (service, objects, _alerts) = service();
        let upload = UploadFile::from_path(&path).await.unwrap();
        let outcome = service.handle_drop(vec![upload], |_| {}).await;

        assert!(matches!(outcome, UploadOutcome::Uploaded(_)));
        let stored = objects.object(&objects.paths()[0]).unwrap();
        assert_eq!(stored, (vec![5u8; 16], "image/webp".to_string()));
    }

    #[tokio::test]
    async fn test_directory_is_not_an_upload() {
        let dir = tempfile::tempdir().unwrap();
        assert!(UploadFile::from_path(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_upload_failure_alerts() {
        let (service, objects, recorded) = service();
        objects.set_failing(true);

        let outcome = service
            .handle_drop(vec![UploadFile::new("a.jpg", vec![1])], |_| {})
            .await;

        assert!(matches!(outcome, UploadOutcome::Failed(_)));
        assert_eq!(recorded.messages(), vec![alerts::UPLOAD_FAILED]);
    }
}
