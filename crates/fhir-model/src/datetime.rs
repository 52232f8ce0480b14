//! Date and timestamp normalization for source date strings.
//!
//! Source extracts mix ISO timestamps, date-only values and US-style dates.
//! Anything without an offset is read as UTC. Unparseable input yields
//! `None`, which callers treat as an absent field.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

const TIMESTAMP_OUTPUT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
const DATE_OUTPUT: &str = "%Y-%m-%d";

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parses a source date or timestamp into a UTC instant.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let value = input.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc());
        }
    }
    parse_date(value).map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Normalizes to `YYYY-MM-DDTHH:MM:SS.sssZ`.
pub fn normalize_timestamp(input: &str) -> Option<String> {
    parse_timestamp(input).map(|instant| instant.format(TIMESTAMP_OUTPUT).to_string())
}

/// Normalizes to a calendar date `YYYY-MM-DD`.
pub fn normalize_date(input: &str) -> Option<String> {
    let value = input.trim();
    parse_date(value)
        .or_else(|| parse_timestamp(value).map(|instant| instant.date_naive()))
        .map(|date| date.format(DATE_OUTPUT).to_string())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    parse_partial_date(value)
}

/// `YYYY-MM` and `YYYY` resolve to the first day of the period.
fn parse_partial_date(value: &str) -> Option<NaiveDate> {
    let mut parts = value.split('-');
    let year = parts.next()?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month = match parts.next() {
        None => 1,
        Some(month) if month.len() == 2 => month.parse().ok()?,
        Some(_) => return None,
    };
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, 1)
}
