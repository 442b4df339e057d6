//! Presigned access integration tests against the in-memory bucket.
//!
//! Run with: `cargo test -p padmakara-services --test access_test`

mod helpers;

use chrono::Utc;
use helpers::{audio_key, query_param, TestBucket};
use padmakara_core::models::AccessMethod;
use padmakara_core::{ErrorMetadata, MediaError};
use padmakara_services::{AccessIssuer, AccessPolicy};

#[tokio::test]
async fn test_download_grant_expires_exactly_after_ttl() {
    let bucket = TestBucket::new();
    let key = audio_key("Day 1", "01 - Opening.mp3");
    bucket.put(&key).await;

    let before = Utc::now();
    let grant = bucket
        .issuer()
        .issue_download("user-42", &key, Some(3600))
        .await
        .unwrap();
    let after = Utc::now();

    assert_eq!(grant.key, key);
    assert_eq!(grant.method, AccessMethod::Get);
    assert_eq!(grant.expires_in_secs, 3600);
    assert_eq!(grant.expires_at - grant.issued_at, chrono::Duration::seconds(3600));
    assert!(grant.issued_at >= before && grant.issued_at <= after);
    assert_eq!(query_param(&grant.url, "X-Amz-Expires"), Some("3600"));
    assert!(!grant.is_expired_at(grant.issued_at));
    assert!(grant.is_expired_at(grant.expires_at));
}

#[tokio::test]
async fn test_default_ttl_is_one_hour() {
    let bucket = TestBucket::new();
    let key = audio_key("Day 1", "01 - Opening.mp3");
    bucket.put(&key).await;

    let grant = bucket
        .issuer()
        .issue_download("user-42", &key, None)
        .await
        .unwrap();
    assert_eq!(grant.expires_in_secs, 3600);
}

#[tokio::test]
async fn test_non_positive_and_oversized_ttl_rejected() {
    let bucket = TestBucket::new();
    let key = audio_key("Day 1", "01 - Opening.mp3");
    bucket.put(&key).await;
    let issuer = bucket.issuer();

    for ttl in [0, -30, 604_801] {
        let result = issuer.issue_download("user-42", &key, Some(ttl)).await;
        assert!(
            matches!(result, Err(MediaError::Validation(_))),
            "ttl {ttl} should be rejected"
        );
    }
}

#[tokio::test]
async fn test_missing_object_is_not_found() {
    let bucket = TestBucket::new();
    let key = audio_key("Day 1", "99 - Missing.mp3");

    let err = bucket
        .issuer()
        .issue_download("user-42", &key, None)
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::ObjectNotFound(_)));
    assert_eq!(err.http_status_code(), 404);
    assert_eq!(err.client_message(), "Content unavailable");
}

#[tokio::test]
async fn test_existence_check_can_be_disabled() {
    let bucket = TestBucket::new();
    let key = audio_key("Day 1", "99 - Missing.mp3");
    let issuer = AccessIssuer::new(
        bucket.storage(),
        AccessPolicy {
            verify_exists: false,
            ..AccessPolicy::default()
        },
    );

    let grant = issuer.issue_download("user-42", &key, None).await.unwrap();
    assert_eq!(grant.key, key);
}

#[tokio::test]
async fn test_signing_failure_is_reported_without_retry() {
    let bucket = TestBucket::new();
    let key = audio_key("Day 1", "01 - Opening.mp3");
    bucket.put(&key).await;
    bucket.memory.fail_signing(true);

    let err = bucket
        .issuer()
        .issue_download("user-42", &key, None)
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::Signing(_)));
    assert!(err.is_recoverable());
    assert!(err.is_sensitive());
}

#[tokio::test]
async fn test_upload_grant_uses_put_and_skips_existence_check() {
    let bucket = TestBucket::new();
    let key = audio_key("Day 2", "03 - Questions.mp3");

    let grant = bucket
        .issuer()
        .issue_upload("admin-1", &key, "audio/mpeg", Some(900))
        .await
        .unwrap();

    assert_eq!(grant.method, AccessMethod::Put);
    assert_eq!(grant.expires_in_secs, 900);
    assert_eq!(query_param(&grant.url, "X-Amz-Expires"), Some("900"));
}

#[tokio::test]
async fn test_grant_serializes_for_callers() {
    let bucket = TestBucket::new();
    let key = audio_key("Day 1", "01 - Opening.mp3");
    bucket.put(&key).await;

    let grant = bucket
        .issuer()
        .issue_download("user-42", &key, None)
        .await
        .unwrap();
    let json = serde_json::to_value(&grant).unwrap();

    assert_eq!(json["key"], key.as_str());
    assert_eq!(json["method"], "GET");
    assert_eq!(json["expires_in_secs"], 3600);
}

#[tokio::test]
async fn test_unbounded_policy_still_caps_ttl() {
    let bucket = TestBucket::new();
    let key = audio_key("Day 1", "01 - Opening.mp3");
    bucket.put(&key).await;
    let issuer = AccessIssuer::new(
        bucket.storage(),
        AccessPolicy {
            max_expiry_secs: u64::MAX,
            ..AccessPolicy::default()
        },
    );

    let err = issuer
        .issue_download("user-42", &key, Some(i64::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::Validation(_)));

    let grant = issuer
        .issue_download("user-42", &key, Some(604_800))
        .await
        .unwrap();
    assert_eq!(grant.expires_in_secs, 604_800);
}
