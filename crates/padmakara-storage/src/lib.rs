//! Padmakara Storage Library
//!
//! The `Storage` trait and its backends: S3 (through `object_store`), the
//! local filesystem and an in-memory bucket for tests.
//!
//! # Storage key format
//!
//! Keys are hierarchical: `{retreat-folder}/{session}/{filename}` for audio
//! and `{retreat-folder}/transcripts/{session}/{filename}` for transcripts.
//! Keys are produced by `padmakara_core::storage_path`; backends only reject
//! keys with a leading `/`, empty segments or `..`.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use padmakara_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ObjectInfo, Storage, StorageError, StorageResult};
