//! In-memory storage for tests and local tooling.
//!
//! Behaves like a bucket managed through a console: uploading an object also
//! records a folder marker for each of its parent prefixes, and markers stay
//! behind when the objects under them are deleted. Presigned URLs carry the
//! same `X-Amz-Date`/`X-Amz-Expires` parameters as SigV4 URLs.

use crate::keys;
use crate::traits::{ObjectInfo, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const DEFAULT_BUCKET: &str = "padmakara-media";

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: String,
    last_modified: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<String, StoredObject>,
    markers: BTreeSet<String>,
    failing_deletes: HashSet<String>,
}

/// In-memory bucket with failure injection.
pub struct MemoryStorage {
    bucket: String,
    state: Mutex<State>,
    fail_signing: AtomicBool,
    delete_calls: AtomicUsize,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_bucket(DEFAULT_BUCKET)
    }

    pub fn with_bucket(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            state: Mutex::new(State::default()),
            fail_signing: AtomicBool::new(false),
            delete_calls: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every later delete of `storage_key` fail with a provider error.
    pub fn fail_deletes_for(&self, storage_key: impl Into<String>) {
        self.state().failing_deletes.insert(storage_key.into());
    }

    /// Toggle signing failures, as with missing provider credentials.
    pub fn fail_signing(&self, fail: bool) {
        self.fail_signing.store(fail, Ordering::SeqCst);
    }

    /// Record an empty folder placeholder.
    pub fn insert_marker(&self, prefix: &str) {
        self.state()
            .markers
            .insert(prefix.trim_end_matches('/').to_string());
    }

    pub fn has_marker(&self, prefix: &str) -> bool {
        self.state().markers.contains(prefix.trim_end_matches('/'))
    }

    /// Stored object keys in lexical order.
    pub fn keys(&self) -> Vec<String> {
        self.state().objects.keys().cloned().collect()
    }

    pub fn object_count(&self) -> usize {
        self.state().objects.len()
    }

    /// Content type recorded at upload.
    pub fn content_type(&self, storage_key: &str) -> Option<String> {
        self.state()
            .objects
            .get(storage_key)
            .map(|object| object.content_type.clone())
    }

    /// Number of delete calls received, successful or not.
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn sign(&self, method: &str, storage_key: &str, expires_in: Duration) -> StorageResult<String> {
        keys::validate_key(storage_key)?;
        if self.fail_signing.load(Ordering::SeqCst) {
            return Err(StorageError::SigningFailed(
                "No credentials available for signing".to_string(),
            ));
        }

        let date = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let expires = expires_in.as_secs();
        let mut hasher = Sha256::new();
        hasher.update(format!("{}\n{}\n{}\n{}", method, storage_key, date, expires));
        let signature = hex::encode(hasher.finalize());

        let encoded = storage_key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        Ok(format!(
            "memory://{}/{}?X-Amz-Algorithm=AWS4-HMAC-SHA256&X-Amz-Date={}&X-Amz-Expires={}&X-Amz-SignedHeaders=host&X-Amz-Signature={}",
            self.bucket, encoded, date, expires, signature
        ))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        keys::validate_key(storage_key)?;
        let mut state = self.state();
        for prefix in keys::parent_prefixes(storage_key) {
            state.markers.insert(prefix.to_string());
        }
        state.objects.insert(
            storage_key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
                last_modified: Utc::now(),
            },
        );
        Ok(format!("memory://{}/{}", self.bucket, storage_key))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<bool> {
        keys::validate_key(storage_key)?;
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        if state.failing_deletes.contains(storage_key) {
            return Err(StorageError::DeleteFailed(format!(
                "Access denied for {}",
                storage_key
            )));
        }
        Ok(state.objects.remove(storage_key).is_some())
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.sign("GET", storage_key, expires_in)
    }

    async fn presigned_put_url(
        &self,
        storage_key: &str,
        _content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.sign("PUT", storage_key, expires_in)
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        keys::validate_key(storage_key)?;
        Ok(self.state().objects.contains_key(storage_key))
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        let prefix = keys::list_prefix(keys::validate_prefix(prefix)?);
        let state = self.state();
        Ok(state
            .objects
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, object)| ObjectInfo {
                key: key.clone(),
                size: object.data.len() as u64,
                last_modified: Some(object.last_modified),
            })
            .collect())
    }

    async fn remove_prefix(&self, prefix: &str) -> StorageResult<bool> {
        let prefix = keys::validate_prefix(prefix)?;
        let listing = keys::list_prefix(prefix);
        let mut state = self.state();
        if state.objects.keys().any(|key| key.starts_with(&listing)) {
            return Ok(false);
        }
        if state.markers.iter().any(|marker| marker.starts_with(&listing)) {
            return Ok(false);
        }
        state.markers.remove(prefix);
        Ok(true)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_records_parent_markers() {
        let storage = MemoryStorage::new();
        storage
            .upload_with_key("Retreat/Day 1/01.mp3", b"a".to_vec(), "audio/mpeg")
            .await
            .unwrap();

        assert!(storage.has_marker("Retreat/Day 1"));
        assert!(storage.has_marker("Retreat"));
        assert_eq!(storage.content_type("Retreat/Day 1/01.mp3").as_deref(), Some("audio/mpeg"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let storage = MemoryStorage::new();
        storage
            .upload_with_key("Retreat/Day 1/01.mp3", b"a".to_vec(), "audio/mpeg")
            .await
            .unwrap();

        assert!(storage.delete("Retreat/Day 1/01.mp3").await.unwrap());
        assert!(!storage.delete("Retreat/Day 1/01.mp3").await.unwrap());
        assert_eq!(storage.delete_calls(), 2);
    }

    #[tokio::test]
    async fn list_only_returns_objects_under_prefix() {
        let storage = MemoryStorage::new();
        for key in ["Retreat/Day 1/a.mp3", "Retreat/Day 10/b.mp3", "Retreat 2/c.mp3"] {
            storage
                .upload_with_key(key, Vec::new(), "audio/mpeg")
                .await
                .unwrap();
        }

        let listed: Vec<_> = storage
            .list("Retreat/Day 1")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        assert_eq!(listed, vec!["Retreat/Day 1/a.mp3"]);
        assert_eq!(storage.list("Retreat").await.unwrap().len(), 2);

        for prefix in ["", "/", "a/../b"] {
            assert!(matches!(
                storage.list(prefix).await,
                Err(StorageError::InvalidKey(_))
            ));
        }
    }

    #[tokio::test]
    async fn remove_prefix_requires_empty_folder() {
        let storage = MemoryStorage::new();
        storage
            .upload_with_key("Retreat/Day 1/a.mp3", Vec::new(), "audio/mpeg")
            .await
            .unwrap();

        assert!(!storage.remove_prefix("Retreat/Day 1").await.unwrap());
        storage.delete("Retreat/Day 1/a.mp3").await.unwrap();
        assert!(!storage.remove_prefix("Retreat").await.unwrap());
        assert!(storage.remove_prefix("Retreat/Day 1").await.unwrap());
        assert!(storage.remove_prefix("Retreat").await.unwrap());
        assert!(!storage.has_marker("Retreat"));
    }

    #[tokio::test]
    async fn injected_failures() {
        let storage = MemoryStorage::new();
        storage.fail_deletes_for("Retreat/locked.mp3");
        let result = storage.delete("Retreat/locked.mp3").await;
        assert!(matches!(result, Err(StorageError::DeleteFailed(_))));

        storage.fail_signing(true);
        let result = storage
            .get_presigned_url("Retreat/a.mp3", Duration::from_secs(60))
            .await;
        assert!(matches!(result, Err(StorageError::SigningFailed(_))));

        storage.fail_signing(false);
        let url = storage
            .get_presigned_url("Retreat/a b.mp3", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.starts_with("memory://padmakara-media/Retreat/a%20b.mp3?"));
        assert!(url.contains("X-Amz-Expires=60"));
        assert!(url.contains("X-Amz-Date="));
    }
}
