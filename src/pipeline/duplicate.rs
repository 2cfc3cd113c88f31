use chrono::{DateTime, Utc};

use crate::types::import::{DuplicateCandidate, ExistingActivity};

/// Returns the first same-day activity the candidate re-imports, if any.
///
/// Matching is a strict chain: start second, type key, end second (both
/// present and equal, or both absent), then sample count. A candidate without
/// a start time never matches.
pub fn find_duplicate<'a>(
    existing_same_day: &'a [ExistingActivity],
    candidate: &DuplicateCandidate,
) -> Option<&'a ExistingActivity> {
    let start = candidate.start_time?;

    existing_same_day.iter().find(|existing| {
        let Some(existing_start) = existing.start_time else {
            return false;
        };
        if !same_second(existing_start, start) {
            return false;
        }
        if existing.activity_type_key != candidate.activity_type_key {
            return false;
        }
        let ends_match = match (existing.end_time, candidate.end_time) {
            (Some(a), Some(b)) => same_second(a, b),
            (None, None) => true,
            _ => false,
        };
        ends_match && existing.sample_count == candidate.sample_count
    })
}

/// Lowercases, turns whitespace and hyphen runs into `_`, drops everything
/// outside `[a-z0-9_]` and trims underscores. Blank input has no key.
pub fn normalize_type_key(label: &str) -> Option<String> {
    let mut key = String::with_capacity(label.len());
    let mut pending_separator = false;

    for ch in label.chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = true;
        } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_separator && !key.is_empty() {
                key.push('_');
            }
            pending_separator = false;
            key.push(ch);
        }
    }

    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

fn same_second(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.timestamp() == b.timestamp()
}
