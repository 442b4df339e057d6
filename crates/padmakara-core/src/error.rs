//! Error types module
//!
//! `MediaError` is the error taxonomy of the media storage subsystem. Every
//! variant bubbles up to the calling layer unchanged; the only failure this
//! subsystem absorbs is deleting an object that is already gone.

use std::io;

/// Level an error is logged at by the layer that reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Caller mistakes such as a bad key or TTL
    Debug,
    /// Missing media and partial cleanups
    Warn,
    /// Provider and configuration failures
    Error,
}

/// How a media error is surfaced to clients and operators. The HTTP layer
/// that embeds this subsystem maps errors through it.
pub trait ErrorMetadata {
    /// HTTP status for the response
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "OBJECT_NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried by the caller)
    fn is_recoverable(&self) -> bool;

    /// Hint shown next to the message
    fn suggested_action(&self) -> Option<&'static str>;

    /// Message safe to show a listener; never contains storage keys
    fn client_message(&self) -> String;

    /// Internal details must stay out of production responses
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Bad or missing identifiers. A caller bug, never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The referenced object does not exist upstream.
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// Provider credential or configuration failure while signing.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// One or more objects could not be deleted. Never blocks entity deletion.
    #[error("Deletion failed for {failed} of {attempted} object(s): {message}")]
    Deletion {
        attempted: usize,
        failed: usize,
        message: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl MediaError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        Self::ObjectNotFound(key.into())
    }

    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }
}

impl From<anyhow::Error> for MediaError {
    fn from(err: anyhow::Error) -> Self {
        MediaError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for MediaError {
    fn from(err: io::Error) -> Self {
        MediaError::Storage(format!("IO error: {}", err))
    }
}

/// (status, code, recoverable, suggested action, sensitive, log level) per variant.
fn media_error_static_metadata(
    err: &MediaError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        MediaError::Validation(_) => (
            400,
            "VALIDATION_ERROR",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        MediaError::ObjectNotFound(_) => (
            404,
            "CONTENT_UNAVAILABLE",
            false,
            Some("The media file is missing; contact an administrator"),
            false,
            LogLevel::Warn,
        ),
        MediaError::Signing(_) => (
            503,
            "SIGNING_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        MediaError::Deletion { .. } => (
            500,
            "DELETION_ERROR",
            true,
            Some("Run storage cleanup again later"),
            true,
            LogLevel::Warn,
        ),
        MediaError::Storage(_) => (
            502,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        MediaError::Config(_) => (
            500,
            "CONFIGURATION_ERROR",
            false,
            Some("Contact support if this error persists"),
            true,
            LogLevel::Error,
        ),
        MediaError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl MediaError {
    /// Variant name, used as the `type` of detailed responses
    pub fn error_type(&self) -> &str {
        match self {
            MediaError::Validation(_) => "Validation",
            MediaError::ObjectNotFound(_) => "ObjectNotFound",
            MediaError::Signing(_) => "Signing",
            MediaError::Deletion { .. } => "Deletion",
            MediaError::Storage(_) => "Storage",
            MediaError::Config(_) => "Config",
            MediaError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Message followed by up to five causes
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for MediaError {
    fn http_status_code(&self) -> u16 {
        media_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        media_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        media_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        media_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        media_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        media_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            MediaError::Validation(ref msg) => msg.clone(),
            MediaError::ObjectNotFound(_) => "Content unavailable".to_string(),
            MediaError::Signing(_) => "Media access is temporarily unavailable".to_string(),
            MediaError::Deletion { failed, .. } => {
                format!("{} stored file(s) could not be removed", failed)
            }
            MediaError::Storage(_) => "Failed to access storage".to_string(),
            MediaError::Config(_) => "Internal server error".to_string(),
            MediaError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_validation() {
        let err = MediaError::validation("session name is required");
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "session name is required");
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_not_found_hides_key() {
        let err = MediaError::not_found("Retreat/Day 1/01 Intro.mp3");
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "CONTENT_UNAVAILABLE");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Content unavailable");
        assert!(!err.client_message().contains("Intro"));
    }

    #[test]
    fn test_error_metadata_signing_is_transient() {
        let err = MediaError::signing("missing credentials");
        assert_eq!(err.http_status_code(), 503);
        assert!(err.is_recoverable());
        assert!(err.is_sensitive());
        assert_eq!(err.suggested_action(), Some("Retry after a short delay"));
    }

    #[test]
    fn test_error_metadata_deletion() {
        let err = MediaError::Deletion {
            attempted: 3,
            failed: 1,
            message: "access denied".to_string(),
        };
        assert_eq!(err.log_level(), LogLevel::Warn);
        assert!(err.to_string().contains("1 of 3"));
        assert!(err.client_message().contains('1'));
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let err = MediaError::from(anyhow::anyhow!("bucket unreachable"));
        assert_eq!(err.error_type(), "Internal");
        assert!(err.detailed_message().contains("bucket unreachable"));
    }
}
