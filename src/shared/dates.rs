//! Calendar helpers shared by import coercion, storage decoding and export.
//!
//! Spreadsheets store dates as a day count ("serial") since their own epoch.
//! Serial 25569 is 1970-01-01, so `(serial - 25569) * 86400` gives Unix
//! seconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

pub const SPREADSHEET_EPOCH_OFFSET_DAYS: f64 = 25569.0;
pub const SECONDS_PER_DAY: f64 = 86400.0;
/// First serial past 9999-12-31, the last day a spreadsheet can hold.
pub const MAX_SERIAL_EXCLUSIVE: f64 = 2958466.0;

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Convert a spreadsheet date serial to an absolute timestamp.
/// Serials at or below 1, or past the spreadsheet calendar, yield `None`.
pub fn serial_to_datetime(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() || serial <= 1.0 || serial >= MAX_SERIAL_EXCLUSIVE {
        return None;
    }
    let millis = ((serial - SPREADSHEET_EPOCH_OFFSET_DAYS) * SECONDS_PER_DAY * 1000.0).round();
    Utc.timestamp_millis_opt(millis as i64).single()
}

/// Parse free-form calendar text. Returns `None` instead of failing.
pub fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date_to_utc(date);
        }
    }

    parse_slashed_date(text).and_then(date_to_utc)
}

/// `a/b/yyyy` or `a-b-yyyy`: day-first when the first part cannot be a
/// month, month-first otherwise.
fn parse_slashed_date(text: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = text.split(|c| c == '/' || c == '-').collect();
    if parts.len() != 3 || parts[2].len() != 4 {
        return None;
    }
    let first: u32 = parts[0].trim().parse().ok()?;
    let second: u32 = parts[1].trim().parse().ok()?;
    let year: i32 = parts[2].trim().parse().ok()?;

    if first > 12 {
        NaiveDate::from_ymd_opt(year, second, first)
    } else {
        NaiveDate::from_ymd_opt(year, first, second)
    }
}

fn date_to_utc(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_45000_is_2023_03_15() {
        let dt = serial_to_datetime(45000.0).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 3, 15, 0, 0, 0).unwrap());
        assert_eq!(dt.timestamp(), (45000 - 25569) * 86400);
    }

    #[test]
    fn test_serial_keeps_time_of_day() {
        let dt = serial_to_datetime(45000.5).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 3, 15, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_serial_at_or_below_one_is_none() {
        assert!(serial_to_datetime(1.0).is_none());
        assert!(serial_to_datetime(0.0).is_none());
        assert!(serial_to_datetime(f64::NAN).is_none());
    }

    #[test]
    fn test_serial_beyond_calendar_is_none() {
        assert!(serial_to_datetime(2958466.0).is_none());
        assert!(serial_to_datetime(3000000.0).is_none());
        // yyyymmdd typed into a numeric cell
        assert!(serial_to_datetime(20240131.0).is_none());

        let last = serial_to_datetime(2958465.0).unwrap();
        assert_eq!(last, Utc.with_ymd_and_hms(9999, 12, 31, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_common_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        assert_eq!(parse_date_text("2024-01-31"), Some(expected));
        assert_eq!(parse_date_text("2024/01/31"), Some(expected));
        assert_eq!(parse_date_text("31/01/2024"), Some(expected));
        assert_eq!(parse_date_text("01/31/2024"), Some(expected));
        assert_eq!(parse_date_text("January 31, 2024"), Some(expected));
        assert_eq!(
            parse_date_text("2024-01-31T10:30:00Z"),
            Some(Utc.with_ymd_and_hms(2024, 1, 31, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_ambiguous_slash_date_is_month_first() {
        assert_eq!(
            parse_date_text("03/04/2024"),
            Some(Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_unparsable_text_is_none() {
        assert!(parse_date_text("not a date").is_none());
        assert!(parse_date_text("31/31/2024").is_none());
        assert!(parse_date_text("").is_none());
    }
}
