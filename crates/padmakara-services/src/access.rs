//! Presigned access issuance.
//!
//! Callers arrive here already authorized; the caller identity is only
//! recorded on the tracing span. URLs themselves are never logged.

use chrono::Utc;
use padmakara_core::models::{AccessMethod, PresignedGrant, StorageKey};
use padmakara_core::{MediaConfig, MediaError};
use padmakara_storage::{Storage, StorageError};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_EXPIRY_SECS: u64 = 3600;
const MAX_EXPIRY_SECS: u64 = 604_800;

/// Expiry bounds and checks applied to every grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    pub default_expiry_secs: u64,
    pub max_expiry_secs: u64,
    /// Head the object before signing a download so missing media surfaces
    /// as `ObjectNotFound` instead of a URL that answers 404.
    pub verify_exists: bool,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            default_expiry_secs: DEFAULT_EXPIRY_SECS,
            max_expiry_secs: MAX_EXPIRY_SECS,
            verify_exists: true,
        }
    }
}

impl AccessPolicy {
    pub fn from_config(config: &MediaConfig) -> Self {
        Self {
            default_expiry_secs: config.presigned_url_expiry_secs,
            max_expiry_secs: config.presigned_url_max_expiry_secs,
            verify_exists: config.verify_object_exists,
        }
    }

    /// Largest lifetime this policy grants. Never above what SigV4 accepts.
    pub fn ceiling_secs(&self) -> u64 {
        self.max_expiry_secs.min(MAX_EXPIRY_SECS)
    }

    /// Requested lifetime in seconds, or the default when none was asked for.
    pub fn resolve_expiry(&self, requested: Option<i64>) -> Result<u64, MediaError> {
        let secs = match requested {
            None => self.default_expiry_secs,
            Some(secs) if secs <= 0 => {
                return Err(MediaError::validation(format!(
                    "expires_in must be a positive number of seconds, got {}",
                    secs
                )))
            }
            Some(secs) => secs.unsigned_abs(),
        };
        let ceiling = self.ceiling_secs();
        if secs == 0 || secs > ceiling {
            return Err(MediaError::validation(format!(
                "expires_in of {} seconds is outside 1..={}",
                secs, ceiling
            )));
        }
        Ok(secs)
    }
}

/// Turns authorized requests into time-limited URLs.
#[derive(Clone)]
pub struct AccessIssuer {
    storage: Arc<dyn Storage>,
    policy: AccessPolicy,
}

impl AccessIssuer {
    pub fn new(storage: Arc<dyn Storage>, policy: AccessPolicy) -> Self {
        Self { storage, policy }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Grant GET access to a stored object.
    #[tracing::instrument(skip(self), fields(caller = %caller, key = %key))]
    pub async fn issue_download(
        &self,
        caller: &str,
        key: &StorageKey,
        expires_in_secs: Option<i64>,
    ) -> Result<PresignedGrant, MediaError> {
        let ttl = self.policy.resolve_expiry(expires_in_secs)?;

        if self.policy.verify_exists && !self.storage.exists(key.as_str()).await? {
            tracing::warn!("Requested media object does not exist");
            return Err(MediaError::not_found(key.as_str()));
        }

        let issued_at = Utc::now();
        let url = self
            .storage
            .get_presigned_url(key.as_str(), Duration::from_secs(ttl))
            .await
            .map_err(signing_error)?;

        tracing::info!(expires_in_secs = ttl, "Issued presigned download URL");

        grant(key, url, AccessMethod::Get, issued_at, ttl)
    }

    /// Grant PUT access so a client can upload straight to the bucket.
    #[tracing::instrument(skip(self), fields(caller = %caller, key = %key))]
    pub async fn issue_upload(
        &self,
        caller: &str,
        key: &StorageKey,
        content_type: &str,
        expires_in_secs: Option<i64>,
    ) -> Result<PresignedGrant, MediaError> {
        let ttl = self.policy.resolve_expiry(expires_in_secs)?;

        let issued_at = Utc::now();
        let url = self
            .storage
            .presigned_put_url(key.as_str(), content_type, Duration::from_secs(ttl))
            .await
            .map_err(signing_error)?;

        tracing::info!(expires_in_secs = ttl, "Issued presigned upload URL");

        grant(key, url, AccessMethod::Put, issued_at, ttl)
    }
}

fn grant(
    key: &StorageKey,
    url: String,
    method: AccessMethod,
    issued_at: chrono::DateTime<Utc>,
    ttl: u64,
) -> Result<PresignedGrant, MediaError> {
    let expires_at = i64::try_from(ttl)
        .ok()
        .and_then(chrono::TimeDelta::try_seconds)
        .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
        .ok_or_else(|| MediaError::validation(format!("expires_in of {} seconds is too large", ttl)))?;
    Ok(PresignedGrant {
        key: key.clone(),
        url,
        method,
        issued_at,
        expires_at,
        expires_in_secs: ttl,
    })
}

/// Provider failures while signing are credential or configuration problems.
fn signing_error(err: StorageError) -> MediaError {
    match err {
        StorageError::InvalidKey(_) => err.into(),
        other => {
            tracing::error!(error = %other, "Failed to sign media URL");
            MediaError::signing(other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_expiry_defaults_and_bounds() {
        let policy = AccessPolicy::default();
        assert_eq!(policy.resolve_expiry(None).unwrap(), 3600);
        assert_eq!(policy.resolve_expiry(Some(60)).unwrap(), 60);
        assert_eq!(policy.resolve_expiry(Some(604_800)).unwrap(), 604_800);

        for bad in [0, -1, i64::MIN, 604_801, i64::MAX] {
            assert!(
                matches!(policy.resolve_expiry(Some(bad)), Err(MediaError::Validation(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn ceiling_never_exceeds_sigv4_limit() {
        let policy = AccessPolicy {
            default_expiry_secs: u64::MAX,
            max_expiry_secs: u64::MAX,
            verify_exists: false,
        };
        assert_eq!(policy.ceiling_secs(), 604_800);
        assert!(matches!(policy.resolve_expiry(Some(i64::MAX)), Err(MediaError::Validation(_))));
        assert!(matches!(policy.resolve_expiry(None), Err(MediaError::Validation(_))));
        assert_eq!(policy.resolve_expiry(Some(604_800)).unwrap(), 604_800);
    }

    #[test]
    fn grant_rejects_unrepresentable_lifetime() {
        let key = StorageKey::parse("Retreat/Day 1/01.mp3").unwrap();
        let now = Utc::now();

        let ok = grant(&key, "u".to_string(), AccessMethod::Get, now, 3600).unwrap();
        assert_eq!(ok.expires_at - ok.issued_at, chrono::Duration::seconds(3600));

        for ttl in [u64::MAX, i64::MAX as u64] {
            assert!(matches!(
                grant(&key, "u".to_string(), AccessMethod::Get, now, ttl),
                Err(MediaError::Validation(_))
            ));
        }
    }

    #[test]
    fn policy_follows_config() {
        let config = MediaConfig::from_lookup(|name| match name {
            "STORAGE_BACKEND" => Some("memory".to_string()),
            "PRESIGNED_URL_EXPIRY_SECS" => Some("900".to_string()),
            "VERIFY_OBJECT_EXISTS" => Some("false".to_string()),
            _ => None,
        })
        .unwrap();
        let policy = AccessPolicy::from_config(&config);
        assert_eq!(policy.default_expiry_secs, 900);
        assert_eq!(policy.max_expiry_secs, 604_800);
        assert!(!policy.verify_exists);
    }
}
