//! Track information parsed from uploaded filenames.
//!
//! Typical input: `001 JKR How to relate to our mind-(12 April AM_part_1).mp3`
//! gives track 1, title `How to relate to our mind` and the qualifier
//! `12 April AM_part_1`. Parsing never fails; unusable names degrade to the
//! bare stem without a track number.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::ParsedTrackName;

/// Audio extensions accepted by the upload pipeline.
pub const SUPPORTED_AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "aac", "flac", "ogg"];

const UNTITLED: &str = "Untitled";

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(\d+)(?:[.\-_\s]+(.*))?$").expect("valid regex"));

static TRAILING_QUALIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(.*?\S)\s*-?\s*\(([^()]*)\)\s*$").expect("valid regex")
});

static SPEAKER_INITIALS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,4}\s+").expect("valid regex"));

static DURATION_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)(\d+)min").expect("valid regex"),
        Regex::new(r"(?i)(\d+)h(\d+)m").expect("valid regex"),
        Regex::new(r"(?i)(\d+)h").expect("valid regex"),
        Regex::new(r"(?i)(\d+)_min").expect("valid regex"),
    ]
});

/// Parse track metadata from a raw uploaded filename.
pub fn parse_track_filename(filename: &str) -> ParsedTrackName {
    let base = file_basename(filename);
    let stem = file_stem(base).trim();
    let duration_hint_minutes = estimate_duration_minutes(base);

    let (track_number, rest) = split_track_number(stem);
    let (body, qualifier) = split_qualifier(rest);
    let title = clean_track_title(body);

    if !title.is_empty() {
        return ParsedTrackName {
            track_number,
            title,
            qualifier,
            duration_hint_minutes,
            original_filename: filename.to_string(),
        };
    }

    let fallback = if !stem.is_empty() {
        stem
    } else if !base.trim().is_empty() {
        base.trim()
    } else {
        UNTITLED
    };

    ParsedTrackName {
        track_number: None,
        title: fallback.to_string(),
        qualifier: None,
        duration_hint_minutes,
        original_filename: filename.to_string(),
    }
}

/// Clean a raw title: drop speaker initials, collapse whitespace, strip
/// punctuation at both ends and capitalize the first letter.
pub fn clean_track_title(title: &str) -> String {
    let title = title.trim();
    let without_initials = match SPEAKER_INITIALS.find(title) {
        Some(m) if m.end() < title.len() => &title[m.end()..],
        _ => title,
    };

    let collapsed = without_initials.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| !c.is_alphanumeric());

    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whether the filename has a supported audio extension.
pub fn is_supported_audio(filename: &str) -> bool {
    file_extension(file_basename(filename))
        .map(|ext| {
            let ext = ext.to_lowercase();
            SUPPORTED_AUDIO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Duration in minutes encoded in a filename, e.g. `45min`, `1h30m`, `2h`.
pub fn estimate_duration_minutes(filename: &str) -> Option<u32> {
    for (idx, pattern) in DURATION_PATTERNS.iter().enumerate() {
        let Some(caps) = pattern.captures(filename) else {
            continue;
        };
        let first: u32 = caps.get(1)?.as_str().parse().ok()?;
        return match idx {
            1 => {
                let minutes: u32 = caps.get(2)?.as_str().parse().ok()?;
                first.checked_mul(60)?.checked_add(minutes)
            }
            2 => first.checked_mul(60),
            _ => Some(first),
        };
    }
    None
}

fn file_basename(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

fn file_extension(base: &str) -> Option<&str> {
    let (stem, ext) = base.rsplit_once('.')?;
    let looks_like_extension = !stem.is_empty()
        && !ext.is_empty()
        && ext.len() <= 5
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    looks_like_extension.then_some(ext)
}

fn file_stem(base: &str) -> &str {
    match file_extension(base) {
        Some(ext) => &base[..base.len() - ext.len() - 1],
        None => base,
    }
}

fn split_track_number(stem: &str) -> (Option<u32>, &str) {
    let Some(caps) = LEADING_NUMBER.captures(stem) else {
        return (None, stem);
    };
    match caps[1].parse::<u32>() {
        Ok(number) if number > 0 => {
            let rest = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            (Some(number), rest)
        }
        _ => (None, stem),
    }
}

fn split_qualifier(rest: &str) -> (&str, Option<String>) {
    let Some(caps) = TRAILING_QUALIFIER.captures(rest) else {
        return (rest, None);
    };
    let body = caps.get(1).map(|m| m.as_str()).unwrap_or(rest);
    let qualifier = caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .filter(|q| !q.is_empty());
    (body, qualifier)
}
