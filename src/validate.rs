//! Input validation and normalization.
//!
//! Dates, timestamps, slot positions and calendar fields are checked here
//! before they reach the tracker. Related types and moods go through the
//! same three-tier resolution: exact match → synonym lookup → error with a
//! suggestion.

use crate::error::{Error, Result};
use crate::model::RelatedType;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

// ── Valid value sets (O(1) lookups) ──────────────────────────

pub static VALID_RELATED_TYPES: LazyLock<HashSet<&str>> =
    LazyLock::new(|| ["daily_task", "night_session"].into_iter().collect());

pub static VALID_MOODS: LazyLock<HashSet<&str>> = LazyLock::new(|| {
    ["tired", "anxious", "low", "calm", "restless"]
        .into_iter()
        .collect()
});

// ── Synonym maps ─────────────────────────────────────────────

pub static RELATED_TYPE_SYNONYMS: LazyLock<HashMap<&str, &str>> = LazyLock::new(|| {
    [
        ("task", "daily_task"),
        ("daily", "daily_task"),
        ("night", "night_session"),
        ("session", "night_session"),
        ("evening", "night_session"),
    ]
    .into_iter()
    .collect()
});

pub static MOOD_SYNONYMS: LazyLock<HashMap<&str, &str>> = LazyLock::new(|| {
    [
        ("sleepy", "tired"),
        ("exhausted", "tired"),
        ("drained", "tired"),
        ("stressed", "anxious"),
        ("worried", "anxious"),
        ("nervous", "anxious"),
        ("sad", "low"),
        ("down", "low"),
        ("blue", "low"),
        ("fine", "calm"),
        ("ok", "calm"),
        ("peaceful", "calm"),
        ("fidgety", "restless"),
        ("wired", "restless"),
    ]
    .into_iter()
    .collect()
});

/// Parse an ISO `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns `InvalidArgument` for anything else.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| Error::InvalidArgument(format!("invalid date '{input}', expected YYYY-MM-DD")))
}

/// Parse a completion timestamp into Unix milliseconds.
///
/// Accepts RFC 3339 (`2024-03-01T21:30:00+08:00`) or a bare date, which
/// is read as midnight UTC.
///
/// # Errors
///
/// Returns `InvalidArgument` if neither form parses.
pub fn parse_timestamp(input: &str) -> Result<i64> {
    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc).timestamp_millis());
    }
    if let Ok(date) = parse_date(trimmed) {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    Err(Error::InvalidArgument(format!(
        "invalid timestamp '{input}', expected RFC 3339 or a YYYY-MM-DD date"
    )))
}

/// Check a slot position against the number of tasks per day.
///
/// # Errors
///
/// Returns `InvalidArgument` when outside `1..=tasks_per_day`.
pub fn validate_position(position: u8, tasks_per_day: usize) -> Result<u8> {
    if position == 0 || usize::from(position) > tasks_per_day {
        return Err(Error::InvalidArgument(format!(
            "position must be between 1 and {tasks_per_day}, got {position}"
        )));
    }
    Ok(position)
}

/// # Errors
///
/// Returns `InvalidArgument` outside 1..=12.
pub fn validate_month(month: u32) -> Result<u32> {
    if (1..=12).contains(&month) {
        Ok(month)
    } else {
        Err(Error::InvalidArgument(format!("month must be 1-12, got {month}")))
    }
}

/// # Errors
///
/// Returns `InvalidArgument` outside 1970..=9999.
pub fn validate_year(year: i32) -> Result<i32> {
    if (1970..=9999).contains(&year) {
        Ok(year)
    } else {
        Err(Error::InvalidArgument(format!("year out of range: {year}")))
    }
}

/// Normalize a note's related type via exact match or synonym lookup.
///
/// # Errors
///
/// Returns `InvalidArgument` with a suggestion when nothing matches.
pub fn normalize_related_type(input: &str) -> Result<RelatedType> {
    let lower = input.to_lowercase();

    let canonical = if VALID_RELATED_TYPES.contains(lower.as_str()) {
        lower
    } else if let Some(&canonical) = RELATED_TYPE_SYNONYMS.get(lower.as_str()) {
        canonical.to_string()
    } else {
        let suggestion = find_closest_match(&lower, &VALID_RELATED_TYPES, &RELATED_TYPE_SYNONYMS);
        return Err(Error::InvalidArgument(match suggestion {
            Some(s) => format!("unknown related_type '{input}' (did you mean: {s}?)"),
            None => format!("unknown related_type '{input}'"),
        }));
    };

    Ok(if canonical == "night_session" {
        RelatedType::NightSession
    } else {
        RelatedType::DailyTask
    })
}

/// Normalize a mood via exact match or synonym lookup.
///
/// Unknown moods pass through lowercased: the catalog may declare moods
/// this list does not know about.
#[must_use]
pub fn normalize_mood(input: &str) -> String {
    let lower = input.trim().to_lowercase();
    if VALID_MOODS.contains(lower.as_str()) {
        return lower;
    }
    MOOD_SYNONYMS
        .get(lower.as_str())
        .map_or(lower, |&canonical| canonical.to_string())
}

/// Find the closest matching value across valid set and synonyms.
fn find_closest_match(
    input: &str,
    valid: &HashSet<&str>,
    synonyms: &HashMap<&str, &str>,
) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;

    for &v in valid.iter().chain(synonyms.keys()) {
        let dist = levenshtein_distance(input, v);
        if dist <= 3 && best.is_none_or(|(_, d)| dist < d) {
            // For synonyms, show what it maps to
            let shown = synonyms.get(v).copied().unwrap_or(v);
            best = Some((shown, dist));
        }
    }

    best.map(|(v, _)| v.to_string())
}

/// Compute the Levenshtein edit distance between two strings.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let a_len = a.len();
    let b_len = b.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for i in 1..=a_len {
        curr[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let d = parse_date("2024-02-29").unwrap();
        assert_eq!(d.to_string(), "2024-02-29");
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let a = parse_timestamp("2024-03-01T00:00:00Z").unwrap();
        let b = parse_timestamp("2024-03-01T08:00:00+08:00").unwrap();
        let c = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert!(parse_timestamp("soon").is_err());
    }

    #[test]
    fn test_validate_position() {
        assert!(validate_position(1, 3).is_ok());
        assert!(validate_position(3, 3).is_ok());
        assert!(validate_position(0, 3).is_err());
        assert!(validate_position(4, 3).is_err());
    }

    #[test]
    fn test_validate_month_and_year() {
        assert!(validate_month(12).is_ok());
        assert!(validate_month(13).is_err());
        assert!(validate_year(2024).is_ok());
        assert!(validate_year(-1).is_err());
    }

    #[test]
    fn test_normalize_related_type() {
        assert_eq!(normalize_related_type("daily_task").unwrap(), RelatedType::DailyTask);
        assert_eq!(normalize_related_type("night").unwrap(), RelatedType::NightSession);
        assert_eq!(normalize_related_type("TASK").unwrap(), RelatedType::DailyTask);

        let err = normalize_related_type("nite_session").unwrap_err();
        assert!(err.to_string().contains("night_session"));
    }

    #[test]
    fn test_normalize_mood() {
        assert_eq!(normalize_mood("Tired"), "tired");
        assert_eq!(normalize_mood("stressed"), "anxious");
        assert_eq!(normalize_mood("hopeful"), "hopeful");
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", "abd"), 1);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }
}
