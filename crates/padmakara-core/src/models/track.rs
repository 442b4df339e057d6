use serde::{Deserialize, Serialize};

/// Track metadata derived from an uploaded filename.
///
/// Computed once at upload time and persisted by the content model; it is only
/// re-derived when the source file is uploaded again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTrackName {
    /// Leading track number, when the filename carries a positive one.
    pub track_number: Option<u32>,
    /// Cleaned, never empty title.
    pub title: String,
    /// Trailing parenthetical note, e.g. `12 April AM_part_1`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    /// Duration hint found in the filename (`45min`, `1h30m`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hint_minutes: Option<u32>,
    pub original_filename: String,
}
