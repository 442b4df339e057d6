//! Padmakara Media Core Library
//!
//! Domain models, error types, configuration, the track filename parser and
//! the storage path resolver shared by every Padmakara media component. Nothing
//! in this crate performs I/O.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_path;
pub mod storage_types;
pub mod track_name;

// Re-export commonly used types
pub use config::MediaConfig;
pub use error::{ErrorMetadata, LogLevel, MediaError};
pub use storage_path::{
    resolve_image_key, resolve_media_key, resolve_retreat_prefix, resolve_session_prefix,
    sanitize_segment,
};
pub use storage_types::StorageBackend;
pub use track_name::{is_supported_audio, parse_track_filename};
