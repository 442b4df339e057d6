//! Padmakara Media Services Layer
//!
//! Presigned access issuance and stored-object lifecycle, built on the
//! `Storage` trait. This crate re-exports the storage facade so callers
//! (the persistence layer's delete hooks, the operator CLI) depend on a single
//! crate.

pub mod access;
pub mod lifecycle;

pub use access::{AccessIssuer, AccessPolicy};
pub use lifecycle::{CleanupReport, CleanupStage, DeletionFailure, LifecycleManager};
#[cfg(feature = "storage-local")]
pub use padmakara_storage::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use padmakara_storage::S3Storage;
pub use padmakara_storage::{
    create_storage, MemoryStorage, ObjectInfo, Storage, StorageBackend, StorageError,
    StorageResult,
};
