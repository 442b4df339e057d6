//! Deterministic mapping from retreat identifiers to object keys.
//!
//! Layout:
//! - audio: `{retreat-folder}/{session}/{filename}`
//! - transcripts: `{retreat-folder}/transcripts/{session}/{filename}`
//! - retreat images: `{date-range} — {retreat name}/images/{retreat name}{ext}`
//!
//! where `{retreat-folder}` is `[{date-range} - ]{group} - {places} - {teachers}`.

use crate::error::MediaError;
use crate::models::{MediaKeyRequest, MediaKind, RetreatDates, RetreatFolder, StorageKey};

const TRANSCRIPTS_FOLDER: &str = "transcripts";
const IMAGES_FOLDER: &str = "images";
const LIST_SEPARATOR: &str = " + ";
const FIELD_SEPARATOR: &str = " - ";

/// Resolve the canonical key of an audio or transcript file.
pub fn resolve_media_key(request: &MediaKeyRequest) -> Result<StorageKey, MediaError> {
    let folder = retreat_folder_segment(&request.folder)?;
    let session = required_segment("session", &request.session)?;
    let filename = required_segment("filename", file_basename(&request.filename))?;

    let segments = match request.kind {
        MediaKind::Audio => vec![folder, session, filename],
        MediaKind::Transcript => vec![folder, TRANSCRIPTS_FOLDER.to_string(), session, filename],
    };
    Ok(StorageKey::from_segments(&segments))
}

/// Top-level folder of a retreat, swept when the whole retreat is deleted.
pub fn resolve_retreat_prefix(folder: &RetreatFolder) -> Result<String, MediaError> {
    retreat_folder_segment(folder)
}

/// Session folder under a retreat, without trailing slash.
pub fn resolve_session_prefix(folder: &RetreatFolder, session: &str) -> Result<String, MediaError> {
    let folder = retreat_folder_segment(folder)?;
    let session = required_segment("session", session)?;
    Ok(format!("{}/{}", folder, session))
}

/// Key of a retreat's cover image. The extension of `filename` is kept as uploaded.
pub fn resolve_image_key(
    retreat_name: &str,
    dates: Option<&RetreatDates>,
    filename: &str,
) -> Result<StorageKey, MediaError> {
    let name = required_segment("retreat name", retreat_name)?;
    let folder = match dates {
        Some(dates) => format!("{} — {}", dates.folder_label(), name),
        None => name.clone(),
    };
    let ext = file_basename(filename)
        .rsplit_once('.')
        .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
        .map(|(_, ext)| sanitize_segment(ext))
        .unwrap_or_default();
    let image = if ext.is_empty() {
        name
    } else {
        format!("{}.{}", name, ext)
    };

    Ok(StorageKey::from_segments(&[
        folder,
        IMAGES_FOLDER.to_string(),
        image,
    ]))
}

/// Make one free-text value safe to use as a single key segment.
///
/// Path separators become `-`, control characters are dropped and whitespace
/// runs collapse to one space. The result may be empty.
pub fn sanitize_segment(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .filter_map(|c| match c {
            '/' | '\\' => Some('-'),
            c if c.is_control() && !c.is_whitespace() => None,
            c => Some(c),
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn required_segment(field: &str, raw: &str) -> Result<String, MediaError> {
    let segment = sanitize_segment(raw);
    match segment.as_str() {
        "" => Err(MediaError::validation(format!("{} must not be empty", field))),
        "." | ".." => Err(MediaError::validation(format!(
            "{} must not be a relative path segment",
            field
        ))),
        _ => Ok(segment),
    }
}

fn required_list(field: &str, values: &[String]) -> Result<String, MediaError> {
    let entries: Vec<String> = values
        .iter()
        .map(|value| sanitize_segment(value))
        .filter(|value| !value.is_empty())
        .collect();
    if entries.is_empty() {
        return Err(MediaError::validation(format!(
            "at least one {} is required",
            field
        )));
    }
    Ok(entries.join(LIST_SEPARATOR))
}

fn retreat_folder_segment(folder: &RetreatFolder) -> Result<String, MediaError> {
    let mut parts = Vec::with_capacity(4);
    if let Some(dates) = &folder.dates {
        parts.push(dates.folder_label());
    }
    parts.push(required_segment("group", &folder.group)?);
    parts.push(required_list("place", &folder.places)?);
    parts.push(required_list("teacher", &folder.teachers)?);
    Ok(parts.join(FIELD_SEPARATOR))
}

fn file_basename(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}
