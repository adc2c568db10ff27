//! Semantic classification of scalar values.
//!
//! The flattener consults these checks to decide whether a raw scalar is
//! really a timestamp or a percentage; either match coerces the emitted
//! field to `string` type so downstream formatting never mangles it.
//! All functions are pure and never fail — unrecognized input is `false`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Key fragments that mark a field as a timestamp regardless of its value.
const TIMESTAMP_KEYWORDS: &[&str] = &[
    "time",
    "timestamp",
    "date",
    "published",
    "created",
    "updated",
    "trading day",
    "tradingday",
];

/// Key fragments that mark a field as a percentage.
const PERCENTAGE_KEYWORDS: &[&str] = &[
    "percent",
    "percentage",
    "pct",
    "change_percent",
    "sentiment_score",
];

/// ISO-date-like prefix: `2024-10-18T19:59:55.291`, `2025-01-02 10:00:00`, ...
static ISO_DATE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("valid regex"));

/// Basic-format compact date-time: `20251226T091138`.
static COMPACT_DATE_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{8}T\d{6}").expect("valid regex"));

/// Unix timestamp in seconds (10 digits) or milliseconds (13 digits).
static UNIX_TIMESTAMP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\d{10}|\d{13})$").expect("valid regex"));

/// String form of a scalar, matching the loose stringification the field
/// catalog stores (`null` becomes `"null"`, booleans `"true"`/`"false"`).
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Returns true when the text looks like a timestamp on its own.
fn matches_timestamp_pattern(text: &str) -> bool {
    ISO_DATE_PREFIX.is_match(text) || COMPACT_DATE_TIME.is_match(text) || UNIX_TIMESTAMP.is_match(text)
}

/// Returns true when the text starts with a `YYYY-MM-DD` date.
pub(crate) fn has_iso_date_prefix(text: &str) -> bool {
    ISO_DATE_PREFIX.is_match(text)
}

/// Decide whether a scalar is semantically a timestamp.
///
/// True when the lower-cased key contains a timestamp keyword, or when the
/// stringified value matches an ISO-date prefix, a compact `YYYYMMDDThhmmss`
/// date-time, or a 10/13-digit unix timestamp. Only strings and numbers can
/// be timestamps; any other type returns false.
pub fn is_timestamp(value: &Value, key: &str) -> bool {
    if !matches!(value, Value::String(_) | Value::Number(_)) {
        return false;
    }

    let key_lower = key.to_lowercase();
    if TIMESTAMP_KEYWORDS.iter().any(|keyword| key_lower.contains(keyword)) {
        return true;
    }

    matches_timestamp_pattern(&scalar_text(value))
}

/// Decide whether a scalar is semantically a percentage.
///
/// True when the lower-cased key contains a percentage keyword, or when the
/// value is a string ending in `%`.
pub fn is_percentage(value: &Value, key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if PERCENTAGE_KEYWORDS.iter().any(|keyword| key_lower.contains(keyword)) {
        return true;
    }

    matches!(value, Value::String(text) if text.ends_with('%'))
}

/// Returns true when an object key reads as a timestamp by itself.
///
/// Used by the flattener's time-series-map detection, which treats each key
/// as a value with no surrounding key context.
pub fn is_timestamp_key(key: &str) -> bool {
    matches_timestamp_pattern(key)
}
