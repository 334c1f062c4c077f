//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod alerts;
pub mod client;
mod demo;
pub mod image_upload;
pub mod logging;
pub mod migration;
mod notification;
pub mod outbox;
pub mod product;
mod workflow;

pub use client::{ClientDirectory, ClientListView};
pub use demo::DemoService;
pub use image_upload::{ImageUploadService, UploadFile, UploadOutcome, UploadRejection};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use notification::NotificationService;
pub use outbox::{PushOutbox, RetryPolicy};
pub use product::ProductDirectory;
pub use workflow::WorkflowJournal;
