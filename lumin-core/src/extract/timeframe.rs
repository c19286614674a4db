//! Roadmap timeframe parsing ("Weeks 1-3", "Month 2")

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

static WEEKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)weeks?\s+(\d+)(?:\s*-\s*(\d+))?").expect("valid regex"));

static MONTHS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)months?\s+(\d+)(?:\s*-\s*(\d+))?").expect("valid regex"));

/// Format GitHub expects for milestone due dates
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Offset of the end of a timeframe from its start
///
/// Ranges use their end: "Weeks 2-5" is five weeks. Months count as 30 days,
/// so the result is approximate.
pub fn timeframe_offset(timeframe: &str) -> Option<Duration> {
    if let Some(end) = range_end(&WEEKS, timeframe) {
        return Duration::try_weeks(end);
    }
    if let Some(end) = range_end(&MONTHS, timeframe) {
        return end.checked_mul(30).and_then(Duration::try_days);
    }
    None
}

/// Due date for a timeframe relative to `now`
pub fn due_date(timeframe: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    timeframe_offset(timeframe).and_then(|offset| now.checked_add_signed(offset))
}

fn range_end(pattern: &Regex, text: &str) -> Option<i64> {
    let caps = pattern.captures(text)?;
    caps.get(2)
        .or_else(|| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
