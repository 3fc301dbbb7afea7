use chrono::DateTime;

/// Convert a Slack `ts` (`"1700000000.123456"`) into an ISO-8601 UTC string
/// truncated to whole seconds, e.g. `"2023-11-14T22:13:20"`.
///
/// Returns `None` if `ts` is not an epoch timestamp.
#[must_use]
pub fn slack_ts_to_iso(ts: &str) -> Option<String> {
    let seconds = ts.trim().split('.').next()?;
    let seconds: i64 = seconds.parse().ok()?;
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
}
