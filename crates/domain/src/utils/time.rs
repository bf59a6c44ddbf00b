//! Timestamp conversion helpers.
//!
//! Every comparison against a [`Window`](crate::Window) goes through
//! [`normalize`]; source payloads are parsed with [`parse_source_timestamp`]
//! so that naive values are pinned to UTC before any comparison happens.

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::errors::{DsrError, Result};

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Parse a timestamp as delivered by the issue tracker.
///
/// Accepts RFC 3339, the `+0000` offset form used by Jira, and naive values
/// which are interpreted as UTC.
///
/// # Errors
/// Returns `DsrError::InvalidInput` when no supported format matches.
pub fn parse_source_timestamp(raw: &str) -> Result<DateTime<FixedOffset>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed);
    }

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(raw, format) {
            return Ok(parsed);
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }

    Err(DsrError::InvalidInput(format!("unrecognized timestamp '{raw}'")))
}

/// Express `timestamp` in `zone`. The instant is unchanged.
pub fn normalize<T: TimeZone>(timestamp: &DateTime<T>, zone: &Tz) -> DateTime<Tz> {
    timestamp.with_timezone(zone)
}

/// Attach `zone` to a wall-clock value.
///
/// Ambiguous wall-clock times (DST fold) resolve to the earlier instant.
///
/// # Errors
/// Returns `DsrError::InvalidWindow` when the wall-clock time does not exist
/// in `zone` (DST gap).
pub fn localize(naive: &NaiveDateTime, zone: &Tz) -> Result<DateTime<Tz>> {
    match zone.from_local_datetime(naive) {
        LocalResult::Single(value) => Ok(value),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(DsrError::InvalidWindow(format!(
            "{naive} does not exist in timezone {}",
            zone.name()
        ))),
    }
}

/// Format a number of seconds as `"{hours}h {minutes}m"`.
///
/// Leftover seconds are truncated.
///
/// # Example
/// ```
/// use dsr_domain::utils::time::format_seconds;
///
/// assert_eq!(format_seconds(0), "0h 0m");
/// assert_eq!(format_seconds(3661), "1h 1m");
/// ```
pub fn format_seconds(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    format!("{hours}h {minutes}m")
}
