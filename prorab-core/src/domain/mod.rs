//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod category;
pub mod client;
mod notification;
pub mod product;
pub mod result;
mod workflow;

pub use category::{Category, CategoryRow, Transaction};
pub use client::{Client, ClientStatus, NewClient, StatusFilter};
pub use notification::{Notification, NotificationData, NotificationType};
pub use product::{Product, ProductRow};
pub use workflow::{WorkflowKind, WorkflowRecord, WorkflowStep};
