//! Local-time helpers.
//!
//! All scheduling decisions (work hours, calendar days, week boundaries)
//! happen in a fixed-offset local zone taken from the config, so the
//! helpers here take the offset explicitly instead of reaching for the
//! system zone.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, Utc};

/// Current time in the configured fixed-offset zone.
/// An out-of-range offset falls back to UTC rather than failing.
pub fn local_now(utc_offset_minutes: i32) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix());
    Utc::now().with_timezone(&offset)
}

/// Today's date string (YYYY-MM-DD) in the configured zone.
pub fn today_str(utc_offset_minutes: i32) -> String {
    local_now(utc_offset_minutes).date_naive().to_string()
}

/// Monday of the week containing `date`.
pub fn monday_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Monday of the current week (YYYY-MM-DD) in the configured zone.
pub fn monday_str(utc_offset_minutes: i32) -> String {
    monday_of_week(local_now(utc_offset_minutes).date_naive()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn test_monday_of_week() {
        // 2026-08-26 is a Wednesday.
        let wed = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap();
        let monday = monday_of_week(wed);
        assert_eq!(monday, NaiveDate::from_ymd_opt(2026, 8, 24).unwrap());
        assert_eq!(monday.weekday(), Weekday::Mon);
        // A Monday maps to itself.
        assert_eq!(monday_of_week(monday), monday);
    }

    #[test]
    fn test_local_now_offset() {
        let utc = local_now(0);
        let ist = local_now(330);
        // Same instant, different wall clock.
        assert_eq!(utc.timestamp(), ist.timestamp());
        assert_eq!(ist.offset().local_minus_utc(), 330 * 60);
    }
}
