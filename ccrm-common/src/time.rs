//! Timestamp utilities

use chrono::{DateTime, Duration, DurationRound, NaiveDate, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current calendar day (UTC); daily sessions are keyed by this
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Document id for a calendar day (`YYYY-MM-DD`)
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` day string
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// First whole hour strictly after `at`
pub fn next_whole_hour(at: DateTime<Utc>) -> DateTime<Utc> {
    let truncated = at.duration_trunc(Duration::hours(1)).unwrap_or(at);
    truncated + Duration::hours(1)
}
