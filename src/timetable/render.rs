use crate::directory::{Directory, DirectoryError, TargetKind};
use crate::timetable::{aggregate, format_range, Prefs};
use chrono::{Duration, NaiveDate};

/// The full fetch → aggregate → format pipeline for one target and one
/// resolved day range. Shared by the conversation machine and the
/// subscription broadcaster so both render identically.
pub async fn render_schedule(
    directory: &dyn Directory,
    target_id: &str,
    kind: TargetKind,
    today: NaiveDate,
    start_offset: i64,
    days: u32,
    prefs: Prefs,
    heading: &str,
) -> Result<String, DirectoryError> {
    let start = today + Duration::days(start_offset);
    let end = start + Duration::days(i64::from(days.max(1)) - 1);
    let raw = directory.fetch_lessons(target_id, kind, start, end).await?;
    let schedule = aggregate(raw);
    Ok(format!(
        "{heading}{}",
        format_range(start, days.max(1), &schedule, prefs)
    ))
}
