//! Parsing and formatting of post publication timestamps. Sources may give a
//! bare date, a local date-time, or a zoned date-time; everything is
//! normalized to UTC so posts from different sources sort against each other.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Offset-less layouts, tried in order. Local times are read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Zoned layouts that [`DateTime::parse_from_rfc3339`] doesn't accept.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
];

/// Parses an ISO-8601-like timestamp into UTC. Accepts `2023-01-01`,
/// `2023-01-01T10:30`, `2023-01-01 10:30:00`, `2023-01-01T10:30:00+02:00`,
/// `2023-01-01T10:30:00Z`, and so on.
pub fn parse(input: &str) -> Result<DateTime<Utc>, Error> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(Error(input.to_owned()))
}

/// Formats a timestamp the way feeds and templates expect it:
/// `2023-02-01T00:00:00Z`. Sub-second precision only appears when present.
pub fn to_rfc3339(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Formats a timestamp for humans, e.g. `February 1, 2023`.
pub fn to_display(date: &DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Returned when a timestamp matches none of the accepted layouts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized date `{0}`; expected an ISO-8601 date or date-time")]
pub struct Error(pub String);
