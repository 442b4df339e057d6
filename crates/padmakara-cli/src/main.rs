//! padmakara-media: operator tooling for the retreat media bucket.
//!
//! Reads the same environment as the platform (STORAGE_BACKEND, S3_BUCKET,
//! AWS_REGION, ...). Output is JSON on stdout; logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use padmakara_cli::{init_tracing, FolderArgs};
use padmakara_core::models::{MediaKeyRequest, StorageKey};
use padmakara_core::{
    is_supported_audio, parse_track_filename, resolve_media_key, resolve_retreat_prefix,
    MediaConfig,
};
use padmakara_services::{create_storage, AccessIssuer, AccessPolicy, LifecycleManager, Storage};
use serde::Serialize;
use std::sync::Arc;

const CLI_CALLER: &str = "padmakara-media-cli";

#[derive(Parser)]
#[command(name = "padmakara-media", about = "Padmakara retreat media storage tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse track number and title from uploaded filenames
    Parse {
        /// Filenames to parse
        #[arg(required = true)]
        filenames: Vec<String>,
    },
    /// Resolve the folder prefix of a retreat
    Folder {
        #[command(flatten)]
        folder: FolderArgs,
    },
    /// Resolve the storage key of a track file
    Resolve {
        #[command(flatten)]
        folder: FolderArgs,
        /// Session name
        #[arg(long)]
        session: String,
        /// Resolve the transcript location instead of the audio one
        #[arg(long)]
        transcript: bool,
        /// Uploaded filename
        filename: String,
    },
    /// Issue a presigned download URL
    Presign {
        /// Storage key
        key: String,
        /// Lifetime in seconds (defaults to PRESIGNED_URL_EXPIRY_SECS)
        #[arg(long, allow_negative_numbers = true)]
        expires_in: Option<i64>,
        /// Identity recorded in the logs
        #[arg(long, default_value = CLI_CALLER)]
        caller: String,
    },
    /// Issue a presigned upload (PUT) URL
    PresignUpload {
        /// Storage key
        key: String,
        /// Content type the client will upload
        #[arg(long, default_value = "audio/mpeg")]
        content_type: String,
        /// Lifetime in seconds (defaults to PRESIGNED_URL_EXPIRY_SECS)
        #[arg(long, allow_negative_numbers = true)]
        expires_in: Option<i64>,
        /// Identity recorded in the logs
        #[arg(long, default_value = CLI_CALLER)]
        caller: String,
    },
    /// Delete objects and prune the folders they leave empty
    Delete {
        /// Storage keys to delete
        keys: Vec<String>,
        /// Also sweep everything under this retreat folder prefix
        #[arg(long)]
        retreat_prefix: Option<String>,
    },
    /// Remove a folder and its parents if they hold no object
    Prune {
        /// Folder prefix
        prefix: String,
    },
    /// Validate configuration and report the storage backend
    Check,
}

#[derive(Serialize)]
struct CheckReport {
    backend: String,
    environment: String,
    bucket: Option<String>,
    region: Option<String>,
    default_expiry_secs: u64,
    max_expiry_secs: u64,
    verify_object_exists: bool,
    cleanup_max_concurrency: usize,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

fn load_config() -> anyhow::Result<MediaConfig> {
    let config = MediaConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn connect(config: &MediaConfig) -> anyhow::Result<Arc<dyn Storage>> {
    create_storage(config)
        .await
        .context("Failed to initialize storage backend")
}

fn parse_keys(raw: &[String]) -> anyhow::Result<Vec<StorageKey>> {
    raw.iter()
        .map(|key| StorageKey::parse(key.as_str()).with_context(|| format!("Invalid key {:?}", key)))
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { filenames } => {
            let parsed: Vec<_> = filenames
                .iter()
                .map(|name| {
                    serde_json::json!({
                        "parsed": parse_track_filename(name),
                        "supported_audio": is_supported_audio(name),
                    })
                })
                .collect();
            print_json(&parsed)?;
        }
        Commands::Folder { folder } => {
            let prefix = resolve_retreat_prefix(&folder.to_folder()?)?;
            print_json(&serde_json::json!({ "prefix": prefix }))?;
        }
        Commands::Resolve {
            folder,
            session,
            transcript,
            filename,
        } => {
            let folder = folder.to_folder()?;
            let request = if transcript {
                MediaKeyRequest::transcript(folder, session, filename)
            } else {
                MediaKeyRequest::audio(folder, session, filename)
            };
            let key = resolve_media_key(&request)?;
            print_json(&serde_json::json!({
                "key": key,
                "parent_prefixes": key.parent_prefixes(),
            }))?;
        }
        Commands::Presign {
            key,
            expires_in,
            caller,
        } => {
            let config = load_config()?;
            let issuer = AccessIssuer::new(connect(&config).await?, AccessPolicy::from_config(&config));
            let grant = issuer
                .issue_download(&caller, &StorageKey::parse(key)?, expires_in)
                .await?;
            print_json(&grant)?;
        }
        Commands::PresignUpload {
            key,
            content_type,
            expires_in,
            caller,
        } => {
            let config = load_config()?;
            let issuer = AccessIssuer::new(connect(&config).await?, AccessPolicy::from_config(&config));
            let grant = issuer
                .issue_upload(&caller, &StorageKey::parse(key)?, &content_type, expires_in)
                .await?;
            print_json(&grant)?;
        }
        Commands::Delete {
            keys,
            retreat_prefix,
        } => {
            let keys = parse_keys(&keys)?;
            let config = load_config()?;
            let lifecycle = LifecycleManager::from_config(connect(&config).await?, &config);
            let report = match retreat_prefix {
                Some(prefix) => lifecycle.delete_retreat(&prefix, &keys).await,
                None if keys.is_empty() => anyhow::bail!("Nothing to delete"),
                None => lifecycle.delete_objects(&keys).await,
            };
            print_json(&report)?;
            report.into_result()?;
        }
        Commands::Prune { prefix } => {
            let config = load_config()?;
            let lifecycle = LifecycleManager::from_config(connect(&config).await?, &config);
            let report = lifecycle.prune(&prefix).await;
            print_json(&report)?;
            report.into_result()?;
        }
        Commands::Check => {
            let config = load_config()?;
            let storage = connect(&config).await?;
            print_json(&CheckReport {
                backend: storage.backend_type().to_string(),
                environment: config.environment.clone(),
                bucket: config.s3_bucket.clone(),
                region: config.region().map(String::from),
                default_expiry_secs: config.presigned_url_expiry_secs,
                max_expiry_secs: config.presigned_url_max_expiry_secs,
                verify_object_exists: config.verify_object_exists,
                cleanup_max_concurrency: config.cleanup_max_concurrency,
            })?;
        }
    }

    Ok(())
}
