//! Time formatting helpers.

use chrono::DateTime;

use boostly_types::Timestamp;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Describe when `then` happened relative to `now`, the way an activity
/// feed does: "Just now", "5 minutes ago", "2 hours ago", "Yesterday",
/// "3 days ago", and the calendar date from a week on.
///
/// Times in the future read as "Just now".
pub fn format_relative(then: Timestamp, now: Timestamp) -> String {
    let elapsed = then.elapsed_since(now);
    let days = elapsed / DAY;
    match days {
        0 if elapsed < MINUTE => "Just now".to_string(),
        0 if elapsed < HOUR => plural(elapsed / MINUTE, "minute"),
        0 => plural(elapsed / HOUR, "hour"),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{days} days ago"),
        _ => calendar_date(then),
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

fn calendar_date(at: Timestamp) -> String {
    i64::try_from(at.as_secs())
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%B %d, %Y").to_string())
        .unwrap_or_else(|| at.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2025-03-15 12:00:00 UTC
    const NOW: u64 = 1_742_040_000;

    fn ago(secs: u64) -> String {
        format_relative(Timestamp::new(NOW - secs), Timestamp::new(NOW))
    }

    #[test]
    fn recent_activity() {
        assert_eq!(ago(0), "Just now");
        assert_eq!(ago(59), "Just now");
        assert_eq!(ago(60), "1 minute ago");
        assert_eq!(ago(45 * MINUTE), "45 minutes ago");
        assert_eq!(ago(HOUR), "1 hour ago");
        assert_eq!(ago(23 * HOUR), "23 hours ago");
    }

    #[test]
    fn older_activity() {
        assert_eq!(ago(DAY + HOUR), "Yesterday");
        assert_eq!(ago(3 * DAY), "3 days ago");
        assert_eq!(ago(6 * DAY + 23 * HOUR), "6 days ago");
        assert_eq!(ago(7 * DAY), "March 08, 2025");
    }

    #[test]
    fn future_reads_as_now() {
        assert_eq!(
            format_relative(Timestamp::new(NOW + 500), Timestamp::new(NOW)),
            "Just now"
        );
    }
}
