use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AdsnapError, Result};
use crate::tools::clean::{clean_text, is_valid_url};

// Lazy static regex patterns
static OFFSET_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:mask|background)-position\s*:\s*-?\d+(?:px)?\s*-(\d+)px").expect("valid regex")
});
static REDIRECT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[?&])u=([^&#]+)").expect("valid regex"));
static YEAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{4}\b").expect("valid regex"));

const DATE_FORMATS: &[&str] = &[
    "%b %d, %Y", // Oct 3, 2024
    "%B %d, %Y", // October 3, 2024
    "%b %d %Y",
    "%B %d %Y",
    "%d %b %Y", // 3 Oct 2024
    "%d %B %Y",
    "%Y-%m-%d",
];

/// Label variants → `(?i)\b(?:Library\s*ID|Ad\s*ID)\s*:?\s*([0-9]+)`.
///
/// Digits are ASCII only; other scripts' numerals are not identifiers.
pub(super) fn identifier_regex(labels: &[String]) -> Result<Regex> {
    let labels: Vec<String> = labels
        .iter()
        .map(|l| words_pattern(l, r"\s*"))
        .filter(|l| !l.is_empty())
        .collect();
    if labels.is_empty() {
        return Err(AdsnapError::invalid_rule("identifier_labels", "no label variants"));
    }
    let pattern = format!(r"(?i)\b(?:{})\s*:?\s*([0-9]+)", labels.join("|"));
    Regex::new(&pattern).map_err(|e| AdsnapError::invalid_rule("identifier_labels", e))
}

/// Marker + separator → `(?i)Started\s+running\s+on\s+(.+?)(?:\s*·|$)`.
pub(super) fn start_date_regex(marker: &str, separator: &str) -> Result<Regex> {
    let marker = words_pattern(marker, r"\s+");
    if marker.is_empty() {
        return Err(AdsnapError::invalid_rule("start_date_marker", "empty marker"));
    }
    let tail = match separator.trim() {
        "" => "$".to_string(),
        sep => format!(r"\s*{}|$", regex::escape(sep)),
    };
    let pattern = format!(r"(?i){marker}\s+(.+?)(?:{tail})");
    Regex::new(&pattern).map_err(|e| AdsnapError::invalid_rule("start_date_marker", e))
}

fn words_pattern(text: &str, joiner: &str) -> String {
    text.split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(joiner)
}

/// Parse the literal date phrase from a card. Never consults the clock.
pub(super) fn parse_date(phrase: &str) -> Option<NaiveDate> {
    let phrase = clean_text(phrase);
    let phrase = phrase.trim_end_matches(['.', ',', ';']).trim();
    if phrase.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(phrase, fmt) {
            return Some(date);
        }
    }
    // Without a literal year the loose parser would fill one in from today.
    if !YEAR_REGEX.is_match(phrase) {
        return None;
    }
    dateparser::parse_with_timezone(phrase, &Utc)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Sprite offset from an inline `style`, e.g. `mask-position: 0px -1188px`.
pub(super) fn sprite_offset(style: &str) -> Option<u32> {
    OFFSET_REGEX
        .captures(style)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Unwrap a redirect href to its `u=` target, or accept a plain absolute URL.
///
/// Returns the candidate even when it fails validation; callers check.
pub(super) fn unwrap_redirect(href: &str) -> Option<String> {
    let href = href.trim();
    if let Some(raw) = REDIRECT_REGEX.captures(href).and_then(|c| c.get(1)) {
        let raw = raw.as_str().replace('+', " ");
        let decoded = urlencoding::decode(&raw)
            .map(|d| d.into_owned())
            .unwrap_or(raw);
        return Some(decoded.trim().to_string());
    }
    is_valid_url(href).then(|| href.to_string())
}

/// Phrase from `phrases` that occurs in `text`, ignoring case.
pub(super) fn find_phrase<'p>(text: &str, phrases: &'p [String]) -> Option<&'p str> {
    let lower = text.to_lowercase();
    phrases
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .find(|p| lower.contains(&p.to_lowercase()))
}

pub(super) fn push_unique(items: &mut Vec<String>, value: String) {
    if !items.iter().any(|existing| existing == &value) {
        items.push(value);
    }
}
