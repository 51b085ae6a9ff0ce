use crate::directory::types::RawLesson;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// One physical lesson occurrence after merging the directory's
/// per-group/per-teacher records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    pub time_start: String,
    pub time_end: String,
    pub name: String,
    pub kind: String,
    pub groups: BTreeSet<String>,
    pub audience: String,
    pub location: Option<String>,
    pub teachers: String,
    pub note: Option<String>,
}

/// Groups raw records by date and collapses records that describe the
/// same lesson. Two records at the same date and `time_start` with an
/// identical name are one physical occurrence split across directory
/// rows: their group sets are unioned and audience/teacher strings
/// comma-joined. Within a date the result is sorted by `time_start`,
/// ties keeping encounter order.
pub fn aggregate(raw: Vec<RawLesson>) -> BTreeMap<NaiveDate, Vec<Lesson>> {
    let mut by_date: BTreeMap<NaiveDate, Vec<Lesson>> = BTreeMap::new();

    for record in raw {
        let Some(date) = record.parsed_date() else {
            tracing::warn!("skipping lesson with unparsable date {:?}", record.date);
            continue;
        };
        let name = record.display_name();
        let audience = record.display_audience();
        let teachers = record.display_lecturer();
        let lessons = by_date.entry(date).or_default();

        if let Some(existing) = lessons
            .iter_mut()
            .find(|l| l.time_start == record.time_start && l.name == name)
        {
            existing.groups.extend(record.group_set());
            if !existing.audience.split(", ").any(|a| a == audience) {
                existing.audience.push_str(", ");
                existing.audience.push_str(&audience);
            }
            if !existing.teachers.split(", ").any(|t| t == teachers) {
                existing.teachers.push_str(", ");
                existing.teachers.push_str(&teachers);
            }
            continue;
        }

        lessons.push(Lesson {
            time_start: record.time_start.clone(),
            time_end: record.time_end.clone(),
            name,
            kind: record.kind.trim().to_owned(),
            groups: record.group_set(),
            audience,
            location: record
                .location
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_owned),
            teachers,
            note: record
                .note
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_owned),
        });
    }

    for lessons in by_date.values_mut() {
        lessons.sort_by(|a, b| a.time_start.cmp(&b.time_start));
    }
    by_date
}
