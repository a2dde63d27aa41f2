//! Backend date format
//!
//! The backend renders timestamps as `dd/MM/yyyy HH:mm` (sometimes with a
//! comma before the time, sometimes with seconds) and plain dates as
//! `dd/MM/yyyy`. Neither sorts as text, so everything that compares dates
//! goes through these functions.

use crate::error::{NormalizationError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Parse `dd/MM/yyyy[, ]HH:mm[:ss]` or a bare `dd/MM/yyyy` (midnight).
///
/// ISO-8601 timestamps are accepted as well, since some endpoints already
/// serialize `LocalDateTime` values that way.
pub fn parse_backend_datetime(input: &str) -> Result<NaiveDateTime> {
    let trimmed = input.trim();
    let cleaned = trimmed.replacen(',', "", 1);
    let mut parts = cleaned.split_whitespace();

    let date_part = parts
        .next()
        .ok_or_else(|| NormalizationError::InvalidDate(input.to_string()))?;
    let time_part = parts.next();
    if parts.next().is_some() {
        return Err(NormalizationError::InvalidDate(input.to_string()));
    }

    if let Ok(date) = NaiveDate::parse_from_str(date_part, DATE_FORMAT) {
        let time = match time_part {
            Some(raw) => parse_time(raw).ok_or_else(|| NormalizationError::InvalidDate(input.to_string()))?,
            None => NaiveTime::MIN,
        };
        return Ok(date.and_time(time));
    }

    parse_iso_datetime(trimmed).ok_or_else(|| NormalizationError::InvalidDate(input.to_string()))
}

/// Parse a plain backend date; any time component is discarded.
pub fn parse_backend_date(input: &str) -> Result<NaiveDate> {
    parse_backend_datetime(input).map(|dt| dt.date())
}

/// Parse a user-entered calendar date: `yyyy-MM-dd` (date inputs) or
/// `dd/MM/yyyy`. Returns `None` rather than an error; callers treat an
/// unparsable value as "does not match".
pub fn parse_calendar_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_backend_date(trimmed).ok())
}

/// Render a timestamp the way the dashboard shows it.
pub fn format_datetime(value: &NaiveDateTime) -> String {
    value.format("%d/%m/%Y %H:%M").to_string()
}

pub fn format_date(value: &NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
}

fn parse_iso_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M").ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn parses_backend_timestamp_variants() {
        assert_eq!(
            parse_backend_datetime("05/03/2024 14:30").unwrap(),
            dt(2024, 3, 5, 14, 30)
        );
        assert_eq!(
            parse_backend_datetime("05/03/2024, 14:30").unwrap(),
            dt(2024, 3, 5, 14, 30)
        );
        assert_eq!(
            parse_backend_datetime("05/03/2024 14:30:59").unwrap(),
            dt(2024, 3, 5, 14, 30) + chrono::Duration::seconds(59)
        );
        assert_eq!(
            parse_backend_datetime("05/03/2024").unwrap(),
            dt(2024, 3, 5, 0, 0)
        );
    }

    #[test]
    fn accepts_iso_timestamps() {
        assert_eq!(
            parse_backend_datetime("2024-03-05T14:30:00").unwrap(),
            dt(2024, 3, 5, 14, 30)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_backend_datetime("").is_err());
        assert!(parse_backend_datetime("31/02/2024").is_err());
        assert!(parse_backend_datetime("05/03/2024 25:00").is_err());
        assert!(parse_backend_datetime("05/03/2024 14:30 extra").is_err());
    }

    #[test]
    fn parsed_dates_sort_chronologically() {
        let mut values: Vec<_> = ["02/01/2024", "31/12/2023", "01/02/2024"]
            .iter()
            .map(|s| parse_backend_date(s).unwrap())
            .collect();
        values.sort();
        assert_eq!(
            values.iter().map(format_date).collect::<Vec<_>>(),
            vec!["31/12/2023", "02/01/2024", "01/02/2024"]
        );
    }

    #[test]
    fn calendar_date_accepts_both_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5);
        assert_eq!(parse_calendar_date("2024-03-05"), expected);
        assert_eq!(parse_calendar_date("05/03/2024"), expected);
        assert_eq!(parse_calendar_date("March 5th"), None);
    }
}
