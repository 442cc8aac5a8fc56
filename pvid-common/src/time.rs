//! Date utilities

use crate::{Error, Result};
use chrono::{Duration, Local, NaiveDate};

/// Date format used on the command line, in config files and in SQL filters
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's date in local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// The day before `date`
pub fn previous_day(date: NaiveDate) -> NaiveDate {
    date - Duration::days(1)
}

/// Default analysis date: yesterday, local time
pub fn yesterday() -> NaiveDate {
    previous_day(today())
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| Error::Config(format!("Invalid date '{}' (expected YYYY-MM-DD): {}", value, e)))
}

/// Format a date as `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Convert seconds to duration
pub fn secs_to_duration(secs: u64) -> std::time::Duration {
    std::time::Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_previous_day_crosses_month() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(previous_day(date), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_yesterday_is_one_day_before_today() {
        assert_eq!(yesterday() + Duration::days(1), today());
    }

    #[test]
    fn test_parse_date_valid() {
        let date = parse_date("2024-01-31").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn test_parse_date_trims_whitespace() {
        assert!(parse_date(" 2024-01-31\n").is_ok());
    }

    #[test]
    fn test_parse_date_rejects_other_formats() {
        assert!(matches!(parse_date("2024/01/31"), Err(Error::Config(_))));
        assert!(matches!(parse_date("2024-02-30"), Err(Error::Config(_))));
        assert!(matches!(parse_date(""), Err(Error::Config(_))));
    }

    #[test]
    fn test_format_date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 5).unwrap();
        assert_eq!(format_date(date), "2023-12-05");
    }

    #[test]
    fn test_secs_to_duration() {
        assert_eq!(secs_to_duration(60), std::time::Duration::from_secs(60));
        assert_eq!(secs_to_duration(0).as_millis(), 0);
    }
}
