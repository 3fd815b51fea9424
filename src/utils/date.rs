use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;

/// Formats tried by [`parse_date`], in priority order. Day-first formats come
/// before month-first ones, so `01/02/2024` is the 1st of February.
pub const COMMON_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%d %b %Y",
    "%d %B %Y",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

pub const ISO_DATE: &str = "%Y-%m-%d";

/// chrono's `%Y` takes a year of any width; formats with `%Y` also have to
/// match a pattern that pins it to four digits.
static COMMON_GUARDS: Lazy<Vec<Option<Regex>>> =
    Lazy::new(|| COMMON_FORMATS.iter().map(|fmt| year_guard(fmt)).collect());

fn year_guard(fmt: &str) -> Option<Regex> {
    if !fmt.contains("%Y") {
        return None;
    }
    let mut pattern = String::from("^");
    let mut chars = fmt.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => match chars.next() {
                Some('Y') => pattern.push_str("[0-9]{4}"),
                Some('m' | 'd' | 'H' | 'M' | 'S') => pattern.push_str(r"\s*[0-9]{1,2}"),
                Some('%') => pattern.push('%'),
                _ => pattern.push_str(".*?"),
            },
            c if c.is_whitespace() => pattern.push_str(r"\s+"),
            c => pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).ok()
}

fn parse_guarded(value: &str, fmt: &str, guard: Option<&Regex>) -> Option<NaiveDateTime> {
    if guard.is_some_and(|re| !re.is_match(value)) {
        return None;
    }
    parse_with(value, fmt)
}

fn parse_with(value: &str, fmt: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, fmt)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, fmt)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Parses `value` against `formats` (or [`COMMON_FORMATS`]); first match wins.
/// Date-only formats yield midnight.
pub fn parse_date(value: &str, formats: Option<&[&str]>) -> Option<NaiveDateTime> {
    let value = value.trim();
    match formats {
        None => COMMON_FORMATS
            .iter()
            .zip(COMMON_GUARDS.iter())
            .find_map(|(fmt, guard)| parse_guarded(value, fmt, guard.as_ref())),
        Some(formats) => formats
            .iter()
            .find_map(|fmt| parse_guarded(value, fmt, year_guard(fmt).as_ref())),
    }
}

pub fn to_iso(value: &str) -> Option<String> {
    parse_date(value, None).map(|dt| dt.format(ISO_DATE).to_string())
}

/// Re-emits a parsed date with `output_fmt`. An invalid output format yields `None`.
pub fn format_date(value: &str, output_fmt: &str) -> Option<String> {
    let dt = parse_date(value, None)?;
    let mut out = String::new();
    write!(out, "{}", dt.format(output_fmt)).ok()?;
    Some(out)
}

pub fn is_valid_date(value: &str) -> bool {
    parse_date(value, None).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_date() {
        let dt = parse_date("2024-01-15", None).unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.time(), NaiveTime::MIN);
    }

    #[test]
    fn test_to_iso_known_formats() {
        assert_eq!(to_iso("15/01/2024").as_deref(), Some("2024-01-15"));
        assert_eq!(to_iso("15-01-2024").as_deref(), Some("2024-01-15"));
        assert_eq!(to_iso("2024/01/15").as_deref(), Some("2024-01-15"));
        assert_eq!(to_iso("15 Jan 2024").as_deref(), Some("2024-01-15"));
        assert_eq!(to_iso("2024-01-15T08:30:00").as_deref(), Some("2024-01-15"));
        assert_eq!(to_iso("2024-01-15 08:30:00").as_deref(), Some("2024-01-15"));
        assert_eq!(to_iso("  2024-01-15  ").as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn test_ambiguous_date_is_day_first() {
        assert_eq!(to_iso("01/02/2024").as_deref(), Some("2024-02-01"));
    }

    #[test]
    fn test_invalid_dates() {
        assert_eq!(to_iso("invalid"), None);
        assert_eq!(to_iso("31/02/2024"), None);
        assert!(!is_valid_date("hello"));
        assert!(is_valid_date("2024-01-15"));
    }

    #[test]
    fn test_year_must_have_four_digits() {
        assert_eq!(to_iso("15-01-24"), None);
        assert_eq!(to_iso("05/06/24"), None);
        assert_eq!(to_iso("1-2-24"), None);
        assert_eq!(to_iso("2024-1-5").as_deref(), Some("2024-01-05"));
        assert!(parse_date("1/15/24", Some(&["%m/%d/%Y"])).is_none());
        assert!(parse_date("1/15/24", Some(&["%m/%d/%y"])).is_some());
    }

    #[test]
    fn test_custom_formats() {
        let dt = parse_date("01/15/2024", Some(&["%m/%d/%Y"])).unwrap();
        assert_eq!(dt.day(), 15);
        assert!(parse_date("01/15/2024", None).is_none());
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-01-15", "%d/%m/%Y").as_deref(), Some("15/01/2024"));
        assert_eq!(format_date("2024-01-15", "%Q"), None);
        assert_eq!(format_date("nope", "%d/%m/%Y"), None);
    }
}
