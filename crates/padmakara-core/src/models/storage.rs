//! Canonical object key and the parent prefixes derived from it.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::error::MediaError;

/// A validated, hierarchical object key such as
/// `Spring Retreat - Lisbon - A. Silva/Day 1/02_Meditation.mp3`.
///
/// Keys never start or end with `/`, never contain empty segments and never
/// contain `.` or `..` segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StorageKey(String);

impl StorageKey {
    /// Validate a raw key, e.g. one read back from a file field in the database.
    pub fn parse(raw: impl Into<String>) -> Result<Self, MediaError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(MediaError::validation("storage key must not be empty"));
        }
        for segment in raw.split('/') {
            match segment {
                "" => {
                    return Err(MediaError::validation(format!(
                        "storage key has an empty segment: {}",
                        raw
                    )))
                }
                "." | ".." => {
                    return Err(MediaError::validation(format!(
                        "storage key has a relative segment: {}",
                        raw
                    )))
                }
                _ => {}
            }
            if segment.chars().any(char::is_control) {
                return Err(MediaError::validation(
                    "storage key contains control characters",
                ));
            }
        }
        Ok(Self(raw))
    }

    /// Join already-sanitized segments.
    pub(crate) fn from_segments(segments: &[String]) -> Self {
        Self(segments.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Folder prefixes holding this key, deepest first, without trailing slash.
    ///
    /// `a/b/c.mp3` yields `["a/b", "a"]`.
    pub fn parent_prefixes(&self) -> Vec<&str> {
        self.0
            .match_indices('/')
            .map(|(idx, _)| &self.0[..idx])
            .rev()
            .collect()
    }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StorageKey {
    type Error = MediaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<StorageKey> for String {
    fn from(key: StorageKey) -> Self {
        key.0
    }
}
