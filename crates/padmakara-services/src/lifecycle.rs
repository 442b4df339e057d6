//! Object deletion and empty-folder pruning.
//!
//! Deleting an entity must never be blocked by storage: every failure is
//! logged and collected in the returned [`CleanupReport`], and the batch
//! carries on. Pruning only starts once every deletion of the batch has
//! finished, then walks the affected folders deepest first.

use futures::stream::{self, StreamExt};
use padmakara_core::models::StorageKey;
use padmakara_core::{MediaConfig, MediaError};
use padmakara_storage::Storage;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

const DEFAULT_MAX_CONCURRENT_DELETES: usize = 4;

/// Step of a cleanup that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupStage {
    Delete,
    Sweep,
    Prune,
}

/// One object or folder that could not be cleaned up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionFailure {
    /// Object key, or folder prefix for sweep and prune failures.
    pub key: String,
    pub stage: CleanupStage,
    pub error: String,
}

/// Outcome of a cleanup batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub deleted: Vec<String>,
    pub already_absent: Vec<String>,
    pub failures: Vec<DeletionFailure>,
    /// Folders left without any object, deepest first.
    pub pruned_prefixes: Vec<String>,
}

impl CleanupReport {
    pub fn attempted(&self) -> usize {
        self.deleted.len()
            + self.already_absent.len()
            + self
                .failures
                .iter()
                .filter(|f| f.stage == CleanupStage::Delete)
                .count()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// For callers that want failures as an error. Nothing is rolled back.
    pub fn into_result(self) -> Result<Self, MediaError> {
        if self.failures.is_empty() {
            return Ok(self);
        }
        let message = self
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.key, f.error))
            .collect::<Vec<_>>()
            .join("; ");
        Err(MediaError::Deletion {
            attempted: self.attempted(),
            failed: self.failures.len(),
            message,
        })
    }

    fn record_failure(&mut self, key: impl Into<String>, stage: CleanupStage, error: String) {
        let key = key.into();
        tracing::error!(key = %key, stage = ?stage, error = %error, "Storage cleanup step failed");
        self.failures.push(DeletionFailure { key, stage, error });
    }
}

/// Deletes stored objects and prunes the folders they leave empty.
#[derive(Clone)]
pub struct LifecycleManager {
    storage: Arc<dyn Storage>,
    max_concurrent_deletes: usize,
}

impl LifecycleManager {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            max_concurrent_deletes: DEFAULT_MAX_CONCURRENT_DELETES,
        }
    }

    pub fn from_config(storage: Arc<dyn Storage>, config: &MediaConfig) -> Self {
        Self::new(storage).with_max_concurrent_deletes(config.cleanup_max_concurrency)
    }

    /// Upper bound on deletions in flight. Zero is treated as one.
    pub fn with_max_concurrent_deletes(mut self, limit: usize) -> Self {
        self.max_concurrent_deletes = limit.max(1);
        self
    }

    /// Delete `keys`, then prune every parent folder left empty.
    #[tracing::instrument(skip(self, keys), fields(count = keys.len()))]
    pub async fn delete_objects(&self, keys: &[StorageKey]) -> CleanupReport {
        let mut report = CleanupReport::default();
        let raw: Vec<String> = keys.iter().map(|k| k.as_str().to_string()).collect();
        self.delete_batch(&raw, &mut report).await;
        self.prune_parents(&raw, &mut report).await;
        log_report("delete_objects", &report);
        report
    }

    /// Remove the audio and transcript of one track.
    #[tracing::instrument(skip_all)]
    pub async fn delete_track(
        &self,
        audio: Option<&StorageKey>,
        transcript: Option<&StorageKey>,
    ) -> CleanupReport {
        let keys: Vec<StorageKey> = audio.into_iter().chain(transcript).cloned().collect();
        self.delete_objects(&keys).await
    }

    /// Remove every file of a session's tracks.
    #[tracing::instrument(skip(self, keys), fields(count = keys.len()))]
    pub async fn delete_session(&self, keys: &[StorageKey]) -> CleanupReport {
        self.delete_objects(keys).await
    }

    /// Remove a retreat's known files, then anything else still stored under
    /// its folder, then the folder itself.
    #[tracing::instrument(skip(self, keys), fields(prefix = %retreat_prefix, count = keys.len()))]
    pub async fn delete_retreat(&self, retreat_prefix: &str, keys: &[StorageKey]) -> CleanupReport {
        let mut report = CleanupReport::default();

        let mut touched: Vec<String> = keys.iter().map(|k| k.as_str().to_string()).collect();
        self.delete_batch(&touched, &mut report).await;

        // An empty or relative prefix would list the whole bucket.
        let retreat_prefix = match folder_prefix(retreat_prefix) {
            Ok(prefix) => prefix,
            Err(e) => {
                report.record_failure(retreat_prefix, CleanupStage::Sweep, e.to_string());
                self.prune_parents(&touched, &mut report).await;
                log_report("delete_retreat", &report);
                return report;
            }
        };

        match self.storage.list(retreat_prefix.as_str()).await {
            Ok(remaining) => {
                let leftovers: Vec<String> = remaining.into_iter().map(|o| o.key).collect();
                if !leftovers.is_empty() {
                    tracing::info!(
                        prefix = %retreat_prefix,
                        count = leftovers.len(),
                        "Sweeping objects left under retreat folder"
                    );
                    self.delete_batch(&leftovers, &mut report).await;
                    touched.extend(leftovers);
                }
            }
            Err(e) => report.record_failure(retreat_prefix.as_str(), CleanupStage::Sweep, e.to_string()),
        }

        // The retreat folder itself is pruned even when no key was passed.
        touched.push(format!("{}/", retreat_prefix));
        self.prune_parents(&touched, &mut report).await;
        log_report("delete_retreat", &report);
        report
    }

    /// Prune `prefix` and its ancestors if they hold no object.
    #[tracing::instrument(skip(self))]
    pub async fn prune(&self, prefix: &str) -> CleanupReport {
        let mut report = CleanupReport::default();
        match folder_prefix(prefix) {
            Ok(folder) => {
                let marker = format!("{}/", folder.as_str());
                self.prune_parents(&[marker], &mut report).await;
            }
            Err(e) => report.record_failure(prefix, CleanupStage::Prune, e.to_string()),
        }
        log_report("prune", &report);
        report
    }

    async fn delete_batch(&self, keys: &[String], report: &mut CleanupReport) {
        let mut seen = HashSet::new();
        let unique: Vec<&String> = keys.iter().filter(|k| seen.insert(k.as_str())).collect();

        let results: Vec<_> = stream::iter(unique)
            .map(|key| {
                let storage = Arc::clone(&self.storage);
                async move { (key, storage.delete(key).await) }
            })
            .buffer_unordered(self.max_concurrent_deletes)
            .collect()
            .await;

        for (key, result) in results {
            match result {
                Ok(true) => {
                    tracing::debug!(key = %key, "Deleted stored object");
                    report.deleted.push(key.clone());
                }
                Ok(false) => {
                    tracing::debug!(key = %key, "Stored object already absent");
                    report.already_absent.push(key.clone());
                }
                Err(e) => report.record_failure(key.as_str(), CleanupStage::Delete, e.to_string()),
            }
        }
    }

    /// Walk every parent folder of `keys` deepest first. A folder that still
    /// holds an object, or a key that failed to delete, keeps all its
    /// ancestors too.
    async fn prune_parents(&self, keys: &[String], report: &mut CleanupReport) {
        let mut blocked: HashSet<String> = HashSet::new();
        for failure in &report.failures {
            if failure.stage == CleanupStage::Delete {
                blocked.extend(ancestors(&failure.key).map(String::from));
            }
        }

        let candidates: BTreeSet<(std::cmp::Reverse<usize>, String)> = keys
            .iter()
            .flat_map(|key| ancestors(key))
            .filter(|prefix| !prefix.is_empty())
            .map(|prefix| (std::cmp::Reverse(depth(prefix)), prefix.to_string()))
            .collect();

        for (_, prefix) in candidates {
            if blocked.contains(&prefix) {
                continue;
            }

            let keep = match self.storage.has_objects(&prefix).await {
                Ok(true) => true,
                Ok(false) => match self.storage.remove_prefix(&prefix).await {
                    Ok(gone) => {
                        if gone {
                            tracing::info!(prefix = %prefix, "Pruned empty storage folder");
                            report.pruned_prefixes.push(prefix.clone());
                        }
                        !gone
                    }
                    Err(e) => {
                        report.record_failure(prefix.as_str(), CleanupStage::Prune, e.to_string());
                        true
                    }
                },
                Err(e) => {
                    report.record_failure(prefix.as_str(), CleanupStage::Prune, e.to_string());
                    true
                }
            };

            if keep {
                blocked.extend(ancestors(&prefix).map(String::from));
            }
        }
    }
}

/// A folder prefix given by a caller, without its trailing slash. Empty
/// prefixes and `.`/`..` segments are rejected.
fn folder_prefix(prefix: &str) -> Result<StorageKey, MediaError> {
    StorageKey::parse(prefix.trim_end_matches('/'))
}

/// Folder prefixes above `key`, deepest first, without trailing slash.
fn ancestors(key: &str) -> impl Iterator<Item = &str> {
    key.rmatch_indices('/').map(move |(idx, _)| &key[..idx])
}

fn depth(prefix: &str) -> usize {
    prefix.matches('/').count()
}

fn log_report(operation: &'static str, report: &CleanupReport) {
    if report.is_clean() {
        tracing::info!(
            operation,
            deleted = report.deleted.len(),
            already_absent = report.already_absent.len(),
            pruned = report.pruned_prefixes.len(),
            "Storage cleanup finished"
        );
    } else {
        tracing::warn!(
            operation,
            deleted = report.deleted.len(),
            already_absent = report.already_absent.len(),
            pruned = report.pruned_prefixes.len(),
            failed = report.failures.len(),
            "Storage cleanup finished with failures"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestors_are_deepest_first() {
        let found: Vec<_> = ancestors("a/b/c.mp3").collect();
        assert_eq!(found, vec!["a/b", "a"]);
        let found: Vec<_> = ancestors("a/b/").collect();
        assert_eq!(found, vec!["a/b", "a"]);
        assert_eq!(ancestors("top.mp3").count(), 0);
    }

    #[test]
    fn folder_prefix_rejects_degenerate_input() {
        assert_eq!(folder_prefix("Retreat/").unwrap().as_str(), "Retreat");
        for bad in ["", "/", "//", "a/../b", "./a", "/Retreat"] {
            assert!(
                matches!(folder_prefix(bad), Err(MediaError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn into_result_reports_failures() {
        let mut report = CleanupReport {
            deleted: vec!["a/1.mp3".to_string()],
            ..Default::default()
        };
        assert!(report.clone().into_result().is_ok());

        report.failures.push(DeletionFailure {
            key: "a/2.mp3".to_string(),
            stage: CleanupStage::Delete,
            error: "access denied".to_string(),
        });
        match report.into_result() {
            Err(MediaError::Deletion {
                attempted,
                failed,
                message,
            }) => {
                assert_eq!(attempted, 2);
                assert_eq!(failed, 1);
                assert!(message.contains("a/2.mp3"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
