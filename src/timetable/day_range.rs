use chrono::{Datelike, NaiveDate};

/// Symbolic day-range choices offered throughout the bot (main menu,
/// search flow, subscriptions). Every entry resolves to a concrete
/// `(start_offset, day_count)` pair relative to the current date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayRange {
    Today,
    Tomorrow,
    TodayAndTomorrow,
    ThisWeek,
    NextWeek,
}

impl DayRange {
    pub const ALL: [DayRange; 5] = [
        DayRange::Today,
        DayRange::Tomorrow,
        DayRange::TodayAndTomorrow,
        DayRange::ThisWeek,
        DayRange::NextWeek,
    ];

    /// Matches the user-facing button label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Today" => Some(DayRange::Today),
            "Tomorrow" => Some(DayRange::Tomorrow),
            "Today and tomorrow" => Some(DayRange::TodayAndTomorrow),
            "This week" => Some(DayRange::ThisWeek),
            "Next week" => Some(DayRange::NextWeek),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DayRange::Today => "Today",
            DayRange::Tomorrow => "Tomorrow",
            DayRange::TodayAndTomorrow => "Today and tomorrow",
            DayRange::ThisWeek => "This week",
            DayRange::NextWeek => "Next week",
        }
    }

    /// Spoken form used in confirmation texts ("schedule for ...").
    pub fn spoken(&self) -> &'static str {
        match self {
            DayRange::Today => "today",
            DayRange::Tomorrow => "tomorrow",
            DayRange::TodayAndTomorrow => "today and tomorrow",
            DayRange::ThisWeek => "this week",
            DayRange::NextWeek => "next week",
        }
    }

    /// Resolves the range against `today`. Week ranges are anchored to
    /// Monday via the ISO weekday, so "this week" includes the current
    /// day and always spans Monday through Sunday.
    pub fn resolve(&self, today: NaiveDate) -> (i64, u32) {
        let weekday = today.weekday().number_from_monday() as i64;
        match self {
            DayRange::Today => (0, 1),
            DayRange::Tomorrow => (1, 1),
            DayRange::TodayAndTomorrow => (0, 2),
            DayRange::ThisWeek => (1 - weekday, 7),
            DayRange::NextWeek => (8 - weekday, 7),
        }
    }
}
