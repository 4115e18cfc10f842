//! Millisecond timestamps.
//!
//! Timeline timestamps are Unix milliseconds (UTC) as `i64`, matching
//! `chrono::DateTime::timestamp_millis`.

use chrono::{DateTime, Utc};

/// Current time as Unix milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render a timestamp as `HH:MM:SS.mmm` (UTC) for table display.
///
/// Out-of-range values render as `"--:--:--.---"` rather than panicking.
pub fn format_clock(timestamp_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(timestamp_ms) {
        Some(dt) => dt.format("%H:%M:%S%.3f").to_string(),
        None => "--:--:--.---".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        // 2024-01-01T10:00:00.250Z
        assert_eq!(format_clock(1_704_103_200_250), "10:00:00.250");
        assert_eq!(format_clock(0), "00:00:00.000");
    }

    #[test]
    fn test_format_clock_out_of_range() {
        assert_eq!(format_clock(i64::MAX), "--:--:--.---");
    }

    #[test]
    fn test_now_is_after_2020() {
        assert!(now_millis() > 1_577_836_800_000);
    }
}
