use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Format an event time range as "MM-dd HH:MM - HH:MM" in the given timezone
pub fn format_range(start: DateTime<Utc>, end: DateTime<Utc>, tz: Tz) -> String {
    let start = start.with_timezone(&tz);
    let end = end.with_timezone(&tz);
    format!(
        "{} - {}",
        start.format("%m-%d %H:%M"),
        end.format("%H:%M")
    )
}

/// Format a date as "YYYY-MM-DD" in the given timezone
pub fn format_date(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%Y-%m-%d").to_string()
}
