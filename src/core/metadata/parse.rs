//! Capture-date string normalization and parsing.
//!
//! Metadata providers hand back whatever text the container or the platform
//! shell produced. Shell-formatted dates in particular carry invisible
//! directional marks around every component ("\u{200e}1/\u{200e}1/\u{200e}2020").

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

/// Exact patterns, tried in order; the first match wins.
///
/// Day-first forms precede month-first ones, so an ambiguous `01/02/2020`
/// reads as 1 February.
///
/// The one exception is the 12-hour clock: slash dates with an AM/PM marker
/// only exist as month-first, so `7/4/2021 6:15 PM` is 4 July while
/// `7/4/2021 18:15` is 7 April. Both readings are pinned by tests.
const DATE_TIME_PATTERNS: &[&str] = &[
    "%Y:%m:%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y:%m:%d %H:%M",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

/// Date-only patterns for the general fallback, read as midnight
const DATE_PATTERNS: &[&str] = &["%Y-%m-%d", "%Y:%m:%d", "%d/%m/%Y", "%d.%m.%Y", "%m/%d/%Y"];

static INVISIBLE_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{0}\x{200B}-\x{200F}\x{202A}-\x{202E}\x{2060}-\x{2064}\x{2066}-\x{2069}\x{FEFF}]")
        .expect("static regex")
});

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Strip formatting characters and quotes, collapse whitespace.
pub fn normalize(raw: &str) -> String {
    let stripped = INVISIBLE_CHARS.replace_all(raw, "");
    let collapsed = WHITESPACE_RUN.replace_all(stripped.trim(), " ");
    collapsed.trim_matches('"').trim().to_string()
}

/// Parse a raw capture-date string into a naive local date-time.
///
/// Exact patterns first, then RFC 3339 / RFC 2822, then bare dates.
pub fn parse_capture_date(raw: &str) -> Option<NaiveDateTime> {
    let text = normalize(raw);
    if text.is_empty() {
        return None;
    }

    DATE_TIME_PATTERNS
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(&text, pattern).ok())
        .or_else(|| parse_general(&text))
}

fn parse_general(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    let date_part = text.split(' ').next().unwrap_or(text);
    DATE_PATTERNS
        .iter()
        .find_map(|pattern| NaiveDate::parse_from_str(date_part, pattern).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
