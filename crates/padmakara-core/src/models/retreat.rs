//! Entity identifiers handed over by the persistence layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Retreat date range as it appears in folder names: `2025.07.09-15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetreatDates {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl RetreatDates {
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Start date in full followed by the end day; a missing end repeats the start day.
    pub fn folder_label(&self) -> String {
        let end = self.end.unwrap_or(self.start);
        format!("{}-{}", self.start.format("%Y.%m.%d"), end.format("%d"))
    }
}

/// Identifiers of the retreat-level folder: `[dates - ]group - places - teachers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetreatFolder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<RetreatDates>,
    pub group: String,
    pub places: Vec<String>,
    pub teachers: Vec<String>,
}

impl RetreatFolder {
    pub fn new(
        group: impl Into<String>,
        place: impl Into<String>,
        teacher: impl Into<String>,
    ) -> Self {
        Self {
            dates: None,
            group: group.into(),
            places: vec![place.into()],
            teachers: vec![teacher.into()],
        }
    }

    pub fn with_dates(mut self, dates: RetreatDates) -> Self {
        self.dates = Some(dates);
        self
    }

    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.places.push(place.into());
        self
    }

    pub fn with_teacher(mut self, teacher: impl Into<String>) -> Self {
        self.teachers.push(teacher.into());
        self
    }
}

/// Which file of a track is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Transcript,
}

/// Everything the resolver needs to place one track file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaKeyRequest {
    pub folder: RetreatFolder,
    pub session: String,
    pub kind: MediaKind,
    pub filename: String,
}

impl MediaKeyRequest {
    pub fn audio(
        folder: RetreatFolder,
        session: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            folder,
            session: session.into(),
            kind: MediaKind::Audio,
            filename: filename.into(),
        }
    }

    pub fn transcript(
        folder: RetreatFolder,
        session: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            folder,
            session: session.into(),
            kind: MediaKind::Transcript,
            filename: filename.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_label_uses_end_day() {
        let dates = RetreatDates::new(
            NaiveDate::from_ymd_opt(2025, 7, 9).unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 15),
        );
        assert_eq!(dates.folder_label(), "2025.07.09-15");
    }

    #[test]
    fn folder_label_repeats_start_day_without_end() {
        let dates = RetreatDates::new(NaiveDate::from_ymd_opt(2025, 4, 12).unwrap(), None);
        assert_eq!(dates.folder_label(), "2025.04.12-12");
    }
}
