//! Storage abstraction trait
//!
//! This module defines the narrow capability the media subsystem needs from an
//! object store: sign, head, delete, list and clean up folder placeholders.

use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use padmakara_core::MediaError;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for MediaError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => MediaError::ObjectNotFound(key),
            StorageError::InvalidKey(msg) | StorageError::InvalidSignature(msg) => {
                MediaError::Validation(msg)
            }
            StorageError::SigningFailed(msg) => MediaError::Signing(msg),
            StorageError::ConfigError(msg) => MediaError::Config(msg),
            other => MediaError::Storage(other.to_string()),
        }
    }
}

/// One object returned by [`Storage::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Storage abstraction trait
///
/// Keys are hierarchical (`{retreat}/{session}/{file}`), never start with `/`
/// and never contain `..` segments. A "prefix" is a key without its last
/// segments and without a trailing slash.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload data to a specific storage key. Returns the object's URL.
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Delete a file by its storage key.
    ///
    /// Returns `false` when nothing was stored under the key; that is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<bool>;

    /// Generate a presigned URL for a direct GET.
    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Generate a presigned PUT URL for direct uploads.
    async fn presigned_put_url(
        &self,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Every object stored below `prefix/`.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>>;

    /// Whether at least one object is stored below `prefix/`.
    async fn has_objects(&self, prefix: &str) -> StorageResult<bool> {
        Ok(!self.list(prefix).await?.is_empty())
    }

    /// Remove the placeholder of an empty folder. Returns `true` when no
    /// folder remains under `prefix` afterwards.
    ///
    /// Backends where folders only exist through their objects keep this
    /// default: once the last object is gone, so is the folder.
    async fn remove_prefix(&self, _prefix: &str) -> StorageResult<bool> {
        Ok(true)
    }

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
