//! Timestamp utilities
//!
//! The catalog stores "date added" as a naive local wall-clock value, so all
//! helpers here work on [`NaiveDateTime`].

use crate::{Error, Result};
use chrono::{DateTime, Local, NaiveDateTime, Timelike};

/// Sub-second fraction attached to whole-second timestamps (0.9 s)
///
/// Rekordbox drops the seconds of values written without a fraction.
pub const SUB_SECOND_FILL_NANOS: u32 = 900_000_000;

/// Accepted `--anchor-datetime` formats (local time)
const ANCHOR_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Formats seen in stored catalog timestamps, without a UTC offset
const STORED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Current local wall-clock time
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Attach [`SUB_SECOND_FILL_NANOS`] when `ts` has no sub-second component
///
/// Values that already carry a fraction are returned unchanged.
pub fn ensure_sub_second(ts: NaiveDateTime) -> NaiveDateTime {
    if ts.nanosecond() == 0 {
        ts.with_nanosecond(SUB_SECOND_FILL_NANOS).unwrap_or(ts)
    } else {
        ts
    }
}

/// Parse an anchor override
///
/// # Errors
/// `Error::Config` listing the accepted formats when nothing matches.
pub fn parse_anchor(raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim();
    ANCHOR_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| {
            Error::Config(format!(
                "Invalid anchor datetime '{}'. Use one of: YYYY-MM-DDTHH:MM:SS, \
                 YYYY-MM-DD HH:MM:SS, YYYY-MM-DDTHH:MM, YYYY-MM-DD HH:MM",
                raw
            ))
        })
}

/// Parse a stored catalog timestamp, leniently
///
/// Accepts an optional fraction, a `T` or space separator, and an optional
/// trailing UTC offset (`+00:00`). With an offset present the wall-clock
/// part is kept as written. Returns `None` for anything unparsable.
pub fn parse_stored(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(with_offset) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f %:z") {
        return Some(with_offset.naive_local());
    }
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(with_offset.naive_local());
    }

    STORED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

/// Format for writing back to the catalog (`YYYY-MM-DD HH:MM:SS.fff +00:00`)
pub fn format_stored(ts: NaiveDateTime) -> String {
    format!("{} +00:00", ts.format("%Y-%m-%d %H:%M:%S%.3f"))
}

/// Format for audit manifests (`YYYY-MM-DD HH:MM:SS.ffffff`); absent → empty
pub fn format_manifest(ts: Option<NaiveDateTime>) -> String {
    match ts {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        None => String::new(),
    }
}

/// Run identifier derived from a start time (`YYYYMMDD-HHMMSS`)
pub fn run_id(ts: NaiveDateTime) -> String {
    ts.format("%Y%m%d-%H%M%S").to_string()
}
