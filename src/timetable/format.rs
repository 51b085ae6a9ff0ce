use crate::timetable::aggregate::Lesson;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, HashSet};

/// Weekday names indexed by ISO weekday − 1 (Monday first).
const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Per-user display preferences honored by the formatter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Prefs {
    pub show_groups: bool,
    pub show_location: bool,
}

pub fn weekday_name(date: NaiveDate) -> &'static str {
    WEEKDAYS[date.weekday().number_from_monday() as usize - 1]
}

/// Renders `days` consecutive dates starting at `start`, one header per
/// date even when the date has no lessons. Lessons sharing a start time
/// get the time-range header once.
pub fn format_range(
    start: NaiveDate,
    days: u32,
    schedule: &BTreeMap<NaiveDate, Vec<Lesson>>,
    prefs: Prefs,
) -> String {
    let mut text = String::new();
    let mut date = start;
    for _ in 0..days {
        text.push_str(&format!(
            "📅 {}, {}\n",
            weekday_name(date),
            date.format("%d.%m.%Y")
        ));
        match schedule.get(&date) {
            Some(lessons) if !lessons.is_empty() => {
                let mut seen_starts = HashSet::new();
                for lesson in lessons {
                    if seen_starts.insert(lesson.time_start.clone()) {
                        text.push_str(&format!(
                            "\n⏱ {} – {} ⏱\n",
                            lesson.time_start, lesson.time_end
                        ));
                    } else {
                        text.push('\n');
                    }
                    format_lesson(&mut text, lesson, prefs);
                }
            }
            _ => text.push_str("No classes\n"),
        }
        text.push('\n');
        date += Duration::days(1);
    }
    text
}

fn format_lesson(text: &mut String, lesson: &Lesson, prefs: Prefs) {
    text.push_str(&lesson.name);
    text.push('\n');
    if !lesson.kind.is_empty() {
        text.push_str(&lesson.kind);
        text.push('\n');
    }
    if prefs.show_groups && !lesson.groups.is_empty() {
        let groups: Vec<&str> = lesson.groups.iter().map(String::as_str).collect();
        text.push_str(&format!("Groups: {}\n", groups.join(", ")));
    }
    text.push_str(&format!("Where: {}", lesson.audience));
    match (&lesson.location, prefs.show_location) {
        (Some(location), true) => text.push_str(&format!(", {location}\n")),
        _ => text.push('\n'),
    }
    text.push_str(&format!("Who: {}\n", lesson.teachers));
    if let Some(note) = &lesson.note {
        text.push_str(&format!("Note: {note}\n"));
    }
}
