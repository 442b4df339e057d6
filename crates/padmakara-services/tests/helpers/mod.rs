//! Test helpers: an in-memory bucket seeded with retreat media.
//!
//! Run from workspace root: `cargo test -p padmakara-services`.

#![allow(dead_code)]

use padmakara_core::models::{MediaKeyRequest, RetreatFolder, StorageKey};
use padmakara_core::resolve_media_key;
use async_trait::async_trait;
use padmakara_services::{
    AccessIssuer, AccessPolicy, LifecycleManager, MemoryStorage, ObjectInfo, Storage,
    StorageBackend, StorageResult,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct TestBucket {
    pub memory: Arc<MemoryStorage>,
}

impl TestBucket {
    pub fn new() -> Self {
        init_test_tracing();
        Self {
            memory: Arc::new(MemoryStorage::new()),
        }
    }

    pub fn storage(&self) -> Arc<dyn Storage> {
        self.memory.clone()
    }

    pub fn issuer(&self) -> AccessIssuer {
        AccessIssuer::new(self.storage(), AccessPolicy::default())
    }

    pub fn lifecycle(&self) -> LifecycleManager {
        LifecycleManager::new(self.storage())
    }

    pub async fn put(&self, key: &StorageKey) {
        self.memory
            .upload_with_key(key.as_str(), b"ID3".to_vec(), "audio/mpeg")
            .await
            .expect("seed upload");
    }
}

/// Route service logs to the test harness; `RUST_LOG=debug` shows them.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn spring_retreat() -> RetreatFolder {
    RetreatFolder::new("Spring Retreat", "Lisbon", "A. Silva")
}

pub fn audio_key(session: &str, filename: &str) -> StorageKey {
    resolve_media_key(&MediaKeyRequest::audio(spring_retreat(), session, filename))
        .expect("valid media key")
}

pub fn transcript_key(session: &str, filename: &str) -> StorageKey {
    resolve_media_key(&MediaKeyRequest::transcript(
        spring_retreat(),
        session,
        filename,
    ))
    .expect("valid media key")
}

/// Value of one query parameter in a URL.
pub fn query_param<'a>(url: &'a str, name: &str) -> Option<&'a str> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

/// Memory bucket whose `list` behaves like object_store on S3: an empty
/// prefix lists the bucket root instead of failing.
pub struct RootListingBucket {
    pub memory: Arc<MemoryStorage>,
    pub listed_prefixes: Mutex<Vec<String>>,
}

impl RootListingBucket {
    pub fn new(memory: Arc<MemoryStorage>) -> Self {
        Self {
            memory,
            listed_prefixes: Mutex::new(Vec::new()),
        }
    }

    pub fn listed_prefixes(&self) -> Vec<String> {
        self.listed_prefixes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for RootListingBucket {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        self.memory.upload_with_key(storage_key, data, content_type).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<bool> {
        self.memory.delete(storage_key).await
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.memory.get_presigned_url(storage_key, expires_in).await
    }

    async fn presigned_put_url(
        &self,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.memory
            .presigned_put_url(storage_key, content_type, expires_in)
            .await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.memory.exists(storage_key).await
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        self.listed_prefixes.lock().unwrap().push(prefix.to_string());
        if prefix.trim_end_matches('/').is_empty() {
            return Ok(self
                .memory
                .keys()
                .into_iter()
                .map(|key| ObjectInfo {
                    key,
                    size: 0,
                    last_modified: None,
                })
                .collect());
        }
        self.memory.list(prefix).await
    }

    async fn has_objects(&self, prefix: &str) -> StorageResult<bool> {
        self.memory.has_objects(prefix).await
    }

    async fn remove_prefix(&self, prefix: &str) -> StorageResult<bool> {
        self.memory.remove_prefix(prefix).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
