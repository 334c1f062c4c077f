//! Prorab Core - business logic for a construction company's back office
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Client, Category, Product, etc.)
//! - **ports**: Trait definitions for external dependencies (DocumentStore, ObjectStore, PushRelay)
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (DuckDB, local files, Telegram, etc.)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use adapters::contracts::StoreContractArchive;
use adapters::duckdb::DuckDbDocumentStore;
use adapters::local_storage::LocalObjectStore;
use adapters::telegram::TelegramRelay;
use config::Config;
use ports::{DocumentStore, ObjectStore, PushRelay, UserAlert};
use services::logging::{record, Logger};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{Client, ClientStatus, NewClient, Notification, NotificationData, Product, StatusFilter};
pub use services::{EntryPoint, LogEvent, LoggingService};

/// Main context for Prorab operations
///
/// Holds the document store, configuration and all services. Must be
/// created inside a tokio runtime: the push outbox starts its worker here.
pub struct ProrabContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub store: Arc<DuckDbDocumentStore>,
    pub logger: Logger,
    pub clients: ClientDirectory,
    pub products: ProductDirectory,
    pub images: ImageUploadService,
    pub notifications: NotificationService,
}

impl ProrabContext {
    pub fn new(data_dir: &Path, alerts: Arc<dyn UserAlert>, logger: Logger) -> Result<Self> {
        let config = Config::load(data_dir)?;

        let db_path = data_dir.join(config.db_filename());
        let store = Arc::new(DuckDbDocumentStore::new(&db_path)?);
        store.ensure_schema()?;
        let documents: Arc<dyn DocumentStore> = store.clone();

        let mut objects = LocalObjectStore::new(config.images_dir(data_dir));
        if let Some(base) = &config.storage.public_base_url {
            objects = objects.with_public_base_url(base)?;
        }
        let objects: Arc<dyn ObjectStore> = Arc::new(objects);

        let outbox = match TelegramRelay::from_env().transpose()? {
            Some(relay) => {
                let relay: Arc<dyn PushRelay> = Arc::new(relay);
                PushOutbox::start(relay, RetryPolicy::from(&config.outbox), logger.clone())
            }
            None => {
                record(&logger, LogEvent::new("push_relay_not_configured"));
                PushOutbox::disabled()
            }
        };

        let contracts = Arc::new(StoreContractArchive::new(Arc::clone(&documents)));
        let clients = ClientDirectory::new(
            Arc::clone(&documents),
            contracts,
            Arc::clone(&alerts),
            logger.clone(),
        );
        let products = ProductDirectory::new(Arc::clone(&documents), Arc::clone(&alerts), logger.clone());
        let images = ImageUploadService::new(objects, alerts, config.upload.max_bytes, logger.clone());
        let notifications = NotificationService::new(documents, outbox, logger.clone());

        Ok(Self {
            config,
            data_dir: data_dir.to_path_buf(),
            store,
            logger,
            clients,
            products,
            images,
            notifications,
        })
    }

    /// Flush queued relay messages before exit
    pub async fn shutdown(&mut self) {
        self.notifications.shutdown().await;
    }
}
