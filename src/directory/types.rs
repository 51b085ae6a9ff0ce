use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeSet;

/// Entity kind understood by the directory service search and schedule
/// endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Group,
    Lecturer,
}

impl TargetKind {
    /// Path/query segment used by the remote API.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            TargetKind::Group => "group",
            TargetKind::Lecturer => "lecturer",
        }
    }
}

/// One `{id, label}` entry returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
}

/// Raw lesson record as returned by the schedule endpoint. The service
/// emits one record per group/teacher, not per physical lesson; the
/// aggregator merges them back together.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLesson {
    #[serde(rename = "beginLesson", default)]
    pub time_start: String,
    #[serde(rename = "endLesson", default)]
    pub time_end: String,
    #[serde(rename = "discipline", default)]
    pub name: String,
    #[serde(rename = "kindOfWork", default)]
    pub kind: String,
    #[serde(rename = "group", default)]
    pub group: Option<String>,
    #[serde(rename = "stream", default)]
    pub stream: Option<String>,
    #[serde(rename = "auditorium", default)]
    pub auditorium: String,
    #[serde(rename = "building", default)]
    pub location: Option<String>,
    #[serde(rename = "lecturer", default)]
    pub lecturer: String,
    #[serde(rename = "date", default)]
    pub date: String,
    #[serde(rename = "note", default)]
    pub note: Option<String>,
}

impl RawLesson {
    /// Lesson date; the service uses `YYYY.MM.DD`.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y.%m.%d").ok()
    }

    /// Group labels for this record: the `group` field, falling back to
    /// the lecture `stream`, comma-split with spaces removed.
    pub fn group_set(&self) -> BTreeSet<String> {
        let raw = self
            .group
            .as_deref()
            .filter(|g| !g.is_empty())
            .or(self.stream.as_deref())
            .unwrap_or("");
        raw.replace(' ', "")
            .split(',')
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Discipline name; the service occasionally leaves it empty.
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            "Untitled".to_owned()
        } else {
            self.name.trim().to_owned()
        }
    }

    /// Room label. The service prefixes auditoriums with building paths
    /// and mixes `_`/`-` separators; only the last path segment is shown.
    pub fn display_audience(&self) -> String {
        let cleaned = self.auditorium.replace('_', "-");
        let last = cleaned.rsplit('/').next().unwrap_or("").trim().to_owned();
        if last.is_empty() {
            "No room".to_owned()
        } else {
            last
        }
    }

    pub fn display_lecturer(&self) -> String {
        if self.lecturer.trim().is_empty() {
            "Unassigned".to_owned()
        } else {
            self.lecturer.trim().to_owned()
        }
    }
}
