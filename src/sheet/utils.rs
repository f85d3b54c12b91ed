use calamine::Data;
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Spreadsheet tokens that stand for "no value".
const MISSING_TOKENS: &[&str] = &["", "nan", "none", "nat", "null", "<na>"];

/// 1) Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// 2) True when a cleaned cell should be treated as absent.
///
/// `"none"` is a real feedback rating, so the rating parser matches it
/// before consulting this.
pub fn is_missing(value: &str) -> bool {
    let v = value.trim().to_ascii_lowercase();
    MISSING_TOKENS.contains(&v.as_str())
}

/// Render a float the way a spreadsheet user expects: integral values
/// without a trailing `.0`.
pub fn format_number(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

/// Excel serial day number (1900 date system) → timestamp.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

/// Convert a workbook cell into the cleaned string form used everywhere else.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => clean_str(s),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => b.to_string(),
        Data::Error(_) => String::new(),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) => clean_str(s),
        Data::DurationIso(s) => clean_str(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_str_strips_quotes_and_whitespace() {
        assert_eq!(clean_str("  \"vcs\"  "), "vcs");
        assert_eq!(clean_str("plain "), "plain");
        assert_eq!(clean_str("\""), "\"");
    }

    #[test]
    fn missing_tokens() {
        assert!(is_missing(""));
        assert!(is_missing("NaN"));
        assert!(is_missing(" nan "));
        assert!(is_missing("NaT"));
        assert!(!is_missing("0"));
        assert!(!is_missing("like"));
    }

    #[test]
    fn integral_floats_drop_fraction() {
        assert_eq!(format_number(2025.0), "2025");
        assert_eq!(format_number(3.5), "3.5");
    }

    #[test]
    fn serial_dates_use_1900_system() {
        let ts = excel_serial_to_datetime(45_658.5).unwrap();
        assert_eq!(ts.format("%Y-%m-%d %H:%M").to_string(), "2025-01-01 12:00");
    }

    #[test]
    fn cells_render_as_clean_strings() {
        assert_eq!(cell_to_string(&Data::Float(32.0)), "32");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::String(" Like ".into())), "Like");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
