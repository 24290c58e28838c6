//! Published-date parsing.
//!
//! Feeds see wildly inconsistent date strings, so parsing tries a chain of
//! formats: RFC 3339 first (the common case for `datetime` attributes and
//! `article:published_time`), then RFC 2822, then a set of legacy layouts.
//! Zone-name suffixes ("MST", "GMT") cannot be resolved to offsets, so
//! those layouts are read as UTC. Total failure yields `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Naive layouts tried after the offset-aware parsers.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%a %b %e %H:%M:%S %Y",
    "%A, %d-%b-%y %H:%M:%S",
];

/// Parse a date string into an instant, or `None` when no format matches.
pub fn parse_published_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    // RubyDate carries a numeric offset mid-string.
    if let Ok(parsed) = DateTime::parse_from_str(raw, "%a %b %d %H:%M:%S %z %Y") {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Some(parsed) = parse_naive(raw) {
        return Some(parsed);
    }

    // Retry with alphabetic zone-name tokens removed ("MST", "GMT").
    let stripped = strip_zone_names(raw);
    if stripped != raw {
        if let Some(parsed) = parse_naive(&stripped) {
            return Some(parsed);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }

    None
}

fn parse_naive(raw: &str) -> Option<DateTime<Utc>> {
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&parsed));
        }
    }
    None
}

fn strip_zone_names(raw: &str) -> String {
    let tokens: Vec<&str> = raw
        .split_whitespace()
        .filter(|token| !is_zone_name(token))
        .collect();
    tokens.join(" ")
}

fn is_zone_name(token: &str) -> bool {
    let len = token.chars().count();
    (2..=5).contains(&len) && token.chars().all(|c| c.is_ascii_uppercase())
}
