//! Timestamp parsing for analytics exports and spot lists
//!
//! All timestamps are naive wall-clock times in the analytics property's
//! timezone. RFC 3339 inputs keep their local wall-clock reading.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp in any of the accepted shapes
///
/// Accepted:
/// - RFC 3339 (`2024-03-05T19:00:00+01:00`)
/// - `YYYY-MM-DD HH:MM[:SS]` and `YYYY-MM-DDTHH:MM[:SS]`
/// - `YYYY-MM-DD` (midnight)
/// - GA compact dimensions: `YYYYMMDD`, `YYYYMMDDHH` (dateHour),
///   `YYYYMMDDHHMM` (dateHourMinute)
pub fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        return parse_compact(s);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// GA compact forms; fields are sliced by position
fn parse_compact(s: &str) -> Option<NaiveDateTime> {
    let field = |range: std::ops::Range<usize>| s.get(range)?.parse::<u32>().ok();

    let (hour, minute) = match s.len() {
        8 => (0, 0),
        10 => (field(8..10)?, 0),
        12 => (field(8..10)?, field(10..12)?),
        _ => return None,
    };

    let year = i32::try_from(field(0..4)?).ok()?;
    NaiveDate::from_ymd_opt(year, field(4..6)?, field(6..8)?)?.and_hms_opt(hour, minute, 0)
}
