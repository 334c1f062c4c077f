//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the DocumentStore port
//! - Local filesystem for the ObjectStore port
//! - Telegram Bot API for the PushRelay port
//! - Document store `contracts` collection for the ContractArchive port
//! - In-memory stores for tests and dry runs
//! - Sample documents for demo mode

pub mod contracts;
pub mod demo;
pub mod duckdb;
pub mod local_storage;
pub mod memory;
pub mod telegram;
