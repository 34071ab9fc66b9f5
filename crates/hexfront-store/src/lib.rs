//! Hexfront Store
//!
//! Collaborator implementations around the pure simulation core:
//!
//! - [`storage::GameStore`] - SQLite-backed game snapshots and the durable
//!   idempotency record store
//! - [`service::GameService`] - async front door that serializes actions
//!   per game while letting distinct games proceed in parallel

pub mod service;
pub mod storage;

pub use service::{GameService, ServiceError};
pub use storage::{GameStore, StorageError, SCHEMA_VERSION};
