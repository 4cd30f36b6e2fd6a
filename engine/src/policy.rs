//! Booking policy: planning horizon, working window, minimum duration, and
//! the date/time input formats shared by the workflows.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};

pub const WORK_START_HOUR: u32 = 6;
/// The window closes at midnight; expressed as hour 24 of the booking day.
pub const WORK_END_HOUR: u32 = 24;
pub const MIN_DURATION_MINUTES: i64 = 10;
pub const PLANNING_DAYS: i64 = 120;

/// Accepts `DD.MM.YYYY` plus the `today` / `tomorrow` keywords.
pub fn parse_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    match text.trim().to_lowercase().as_str() {
        "today" => Some(today),
        "tomorrow" => Some(today + Duration::days(1)),
        trimmed => NaiveDate::parse_from_str(trimmed, "%d.%m.%Y").ok(),
    }
}

/// Accepts `HH:MM`.
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M").ok()
}

pub fn combine(day: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    day.and_time(time).and_utc()
}

/// An end time of `00:00` means midnight at the end of the chosen day.
pub fn combine_end(day: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    if time == NaiveTime::MIN {
        closing_bound(day)
    } else {
        combine(day, time)
    }
}

/// The instant the working window closes on `day`.
pub fn closing_bound(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc() + Duration::hours(WORK_END_HOUR as i64)
}

pub fn within_working_window(time: NaiveTime) -> bool {
    time.hour() >= WORK_START_HOUR && time.hour() < WORK_END_HOUR
}

/// The `-` / `—` marker (or blank text) means "leave the field empty".
pub fn is_empty_marker(text: &str) -> bool {
    matches!(text.trim(), "" | "-" | "—")
}
