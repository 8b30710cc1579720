//! Memo timestamp display.

use chrono::{DateTime, Local, TimeZone, Utc};

/// Formats a memo creation time relative to `now_millis` in local time.
///
/// Same calendar day: `HH:MM`. Otherwise: `YYYY-MM-DD`.
pub fn format_memo_timestamp(ts_millis: i64, now_millis: i64) -> String {
    format_memo_timestamp_in(ts_millis, now_millis, &Local)
}

/// Same as [`format_memo_timestamp`], in the given time zone.
pub fn format_memo_timestamp_in<Tz: TimeZone>(ts_millis: i64, now_millis: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let (Some(ts), Some(now)) = (
        DateTime::<Utc>::from_timestamp_millis(ts_millis),
        DateTime::<Utc>::from_timestamp_millis(now_millis),
    ) else {
        return String::new();
    };
    let ts = ts.with_timezone(tz);
    let now = now.with_timezone(tz);

    if ts.date_naive() == now.date_naive() {
        ts.format("%H:%M").to_string()
    } else {
        ts.format("%Y-%m-%d").to_string()
    }
}
