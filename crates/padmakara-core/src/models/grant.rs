use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StorageKey;

/// HTTP verb a presigned URL is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessMethod {
    Get,
    Put,
}

impl AccessMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMethod::Get => "GET",
            AccessMethod::Put => "PUT",
        }
    }
}

impl Display for AccessMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A time-limited capability URL for one stored object. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignedGrant {
    pub key: StorageKey,
    pub url: String,
    pub method: AccessMethod,
    pub issued_at: DateTime<Utc>,
    /// Always `issued_at + expires_in_secs`.
    pub expires_at: DateTime<Utc>,
    pub expires_in_secs: u64,
}

impl PresignedGrant {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
