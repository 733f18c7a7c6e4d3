use time::OffsetDateTime;
use time::macros::format_description;

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    (nanos / 1_000_000) as i64
}

/// Format epoch milliseconds as `YYYY-MM-DD HH:MM` (UTC).
///
/// Values outside the representable range format as `?`.
pub fn format_millis(millis: i64) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|datetime| datetime.format(&format).ok())
        .unwrap_or_else(|| "?".to_string())
}
