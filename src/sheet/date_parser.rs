use chrono::{NaiveDate, NaiveDateTime};

use crate::sheet::utils::{clean_str, excel_serial_to_datetime, is_missing};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Lenient date parse with coerce semantics: anything unrecognised is `None`.
///
/// Accepts ISO dates and timestamps, `YYYY/MM/DD[ hh:mm:ss]`, `DD/MM/YYYY`
/// and bare Excel serial numbers (as written by CSV exports of workbooks).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = clean_str(raw);
    if is_missing(&s) {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(&s, fmt) {
            return Some(ts.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(&s, fmt) {
            return Some(d);
        }
    }

    // Serial numbers: plausible range only, so plain integers like a year don't
    // turn into dates in 1905.
    if let Ok(serial) = s.parse::<f64>() {
        if (20_000.0..=80_000.0).contains(&serial) {
            return excel_serial_to_datetime(serial).map(|ts| ts.date());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_common_layouts() {
        assert_eq!(parse_date("2025-08-04"), Some(ymd(2025, 8, 4)));
        assert_eq!(parse_date("2025-08-04 13:45:00"), Some(ymd(2025, 8, 4)));
        assert_eq!(parse_date("2025/08/04 13:45:00"), Some(ymd(2025, 8, 4)));
        assert_eq!(parse_date("\"2024/12/14\""), Some(ymd(2024, 12, 14)));
        assert_eq!(parse_date("04/08/2025"), Some(ymd(2025, 8, 4)));
        assert_eq!(parse_date("2025-08-04T09:00:00.250"), Some(ymd(2025, 8, 4)));
    }

    #[test]
    fn parses_excel_serials() {
        assert_eq!(parse_date("45658"), Some(ymd(2025, 1, 1)));
    }

    #[test]
    fn coerces_garbage_to_none() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("NaT"), None);
        assert_eq!(parse_date("next tuesday"), None);
        assert_eq!(parse_date("2025"), None);
    }
}
