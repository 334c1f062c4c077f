//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod alert;
mod contract_archive;
pub mod document_store;
mod object_store;
mod push_relay;

pub use alert::UserAlert;
pub use contract_archive::ContractArchive;
pub use document_store::{collections, Document, DocumentStore, Fields, Query, WriteBatch, WriteOp};
pub use object_store::ObjectStore;
pub use push_relay::PushRelay;
