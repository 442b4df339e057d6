//! Configuration module
//!
//! Storage backend selection plus the presigning and cleanup knobs. Values
//! come from the process environment (after loading `.env`) and are handed to
//! the components explicitly.

use std::env;

use crate::storage_types::StorageBackend;

const PRESIGNED_URL_EXPIRY_SECS: u64 = 3600;
/// SigV4 refuses presigned URLs valid for longer than seven days.
const PRESIGNED_URL_MAX_EXPIRY_SECS: u64 = 604_800;
const CLEANUP_MAX_CONCURRENCY: usize = 4;
const MIN_SIGNING_SECRET_LEN: usize = 32;

#[derive(Clone, Debug)]
pub struct MediaConfig {
    pub environment: String,
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, R2, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub local_signing_secret: Option<String>,
    pub presigned_url_expiry_secs: u64,
    pub presigned_url_max_expiry_secs: u64,
    /// Head the object before signing a download URL.
    pub verify_object_exists: bool,
    pub cleanup_max_concurrency: usize,
}

impl MediaConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(raw) => raw.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        let presigned_url_expiry_secs = lookup("PRESIGNED_URL_EXPIRY_SECS")
            .unwrap_or_else(|| PRESIGNED_URL_EXPIRY_SECS.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PRESIGNED_URL_EXPIRY_SECS must be a positive number"))?;

        let presigned_url_max_expiry_secs = lookup("PRESIGNED_URL_MAX_EXPIRY_SECS")
            .unwrap_or_else(|| PRESIGNED_URL_MAX_EXPIRY_SECS.to_string())
            .parse()
            .map_err(|_| {
                anyhow::anyhow!("PRESIGNED_URL_MAX_EXPIRY_SECS must be a positive number")
            })?;

        let verify_object_exists = match lookup("VERIFY_OBJECT_EXISTS") {
            Some(raw) => parse_flag("VERIFY_OBJECT_EXISTS", &raw)?,
            None => true,
        };

        let cleanup_max_concurrency = lookup("CLEANUP_MAX_CONCURRENCY")
            .unwrap_or_else(|| CLEANUP_MAX_CONCURRENCY.to_string())
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("CLEANUP_MAX_CONCURRENCY must be a positive number"))?;

        let config = MediaConfig {
            environment,
            storage_backend,
            s3_bucket: non_empty(lookup("S3_BUCKET")),
            s3_region: non_empty(lookup("S3_REGION")),
            s3_endpoint: non_empty(lookup("S3_ENDPOINT")),
            aws_region: non_empty(lookup("AWS_REGION")),
            local_storage_path: non_empty(lookup("LOCAL_STORAGE_PATH")),
            local_storage_base_url: non_empty(lookup("LOCAL_STORAGE_BASE_URL")),
            local_signing_secret: non_empty(lookup("LOCAL_SIGNING_SECRET")),
            presigned_url_expiry_secs,
            presigned_url_max_expiry_secs,
            verify_object_exists,
            cleanup_max_concurrency,
        };

        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    /// `S3_REGION`, falling back to `AWS_REGION`.
    pub fn region(&self) -> Option<&str> {
        self.s3_region.as_deref().or(self.aws_region.as_deref())
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.presigned_url_expiry_secs == 0 {
            return Err(anyhow::anyhow!(
                "PRESIGNED_URL_EXPIRY_SECS must be greater than zero"
            ));
        }

        if self.presigned_url_expiry_secs > self.presigned_url_max_expiry_secs {
            return Err(anyhow::anyhow!(
                "PRESIGNED_URL_EXPIRY_SECS ({}) exceeds PRESIGNED_URL_MAX_EXPIRY_SECS ({})",
                self.presigned_url_expiry_secs,
                self.presigned_url_max_expiry_secs
            ));
        }

        if self.presigned_url_max_expiry_secs > PRESIGNED_URL_MAX_EXPIRY_SECS {
            return Err(anyhow::anyhow!(
                "PRESIGNED_URL_MAX_EXPIRY_SECS cannot exceed {} seconds",
                PRESIGNED_URL_MAX_EXPIRY_SECS
            ));
        }

        if self.cleanup_max_concurrency == 0 {
            return Err(anyhow::anyhow!(
                "CLEANUP_MAX_CONCURRENCY must be at least 1"
            ));
        }

        // Validate storage backend configuration
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.region().is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
                match &self.local_signing_secret {
                    None => {
                        return Err(anyhow::anyhow!(
                            "LOCAL_SIGNING_SECRET must be set when using local storage backend"
                        ))
                    }
                    Some(secret) if secret.len() < MIN_SIGNING_SECRET_LEN => {
                        return Err(anyhow::anyhow!(
                            "LOCAL_SIGNING_SECRET must be at least {} characters long",
                            MIN_SIGNING_SECRET_LEN
                        ))
                    }
                    Some(_) => {}
                }
            }
            StorageBackend::Memory => {
                if self.is_production() {
                    return Err(anyhow::anyhow!(
                        "STORAGE_BACKEND=memory is not allowed in production"
                    ));
                }
            }
        }

        Ok(())
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, anyhow::Error> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!("{} must be true or false, got {:?}", name, raw)),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
