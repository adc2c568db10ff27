//! Fail-soft display formatting for resolved field values.
//!
//! Widgets hand every resolved value through [`auto_format`]; nothing here
//! returns an error. Unparsable input comes back unchanged as a string, and
//! date-like strings are returned verbatim so timestamps are never mangled
//! by numeric grouping.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use dashwire_types::FormatHint;
use serde_json::Value;

use crate::classify::has_iso_date_prefix;

/// Format a value for display under the given hint.
///
/// `null` renders as `N/A`. In `auto` mode, date-like strings pass through
/// verbatim, numeric-looking values are grouped with four fraction digits
/// when `0 < |v| < 1` and two otherwise, and anything else is stringified.
pub fn auto_format(value: &Value, hint: FormatHint) -> String {
    if value.is_null() {
        return "N/A".to_string();
    }

    match hint {
        FormatHint::Auto => auto_format_value(value),
        FormatHint::Currency => format_currency(value),
        FormatHint::Percentage => format_percentage(value, 2),
        FormatHint::Number => format_number(value, 2),
        FormatHint::Date => format_date(value),
    }
}

fn auto_format_value(value: &Value) -> String {
    // Dates and timestamps pass through before any numeric parsing.
    if let Value::String(text) = value {
        if has_iso_date_prefix(text) {
            return text.clone();
        }
        let lower = text.to_lowercase();
        if lower.contains("trading day") || lower.contains("timestamp") || lower.contains("date") {
            return text.clone();
        }
    }

    if let Some(number) = numeric_value(value) {
        if number != 0.0 && number.abs() < 1.0 {
            return grouped(number, 4);
        }
        return grouped(number, 2);
    }

    display_text(value)
}

/// `$`-prefixed currency with thousands grouping and 2–8 fraction digits
/// (trailing zeros beyond two trimmed). Non-numeric input is returned
/// unchanged.
pub fn format_currency(value: &Value) -> String {
    let Some(number) = numeric_value(value) else {
        return display_text(value);
    };

    let mut fixed = format!("{number:.8}");
    if let Some(dot) = fixed.find('.') {
        let keep_at_least = dot + 3;
        while fixed.len() > keep_at_least && fixed.ends_with('0') {
            fixed.pop();
        }
    }

    let amount = group_digits(&fixed);
    match amount.strip_prefix('-') {
        Some(magnitude) => format!("-${magnitude}"),
        None => format!("${amount}"),
    }
}

/// Fixed-decimal percentage suffix; non-numeric input is returned unchanged.
pub fn format_percentage(value: &Value, decimals: usize) -> String {
    match numeric_value(value) {
        Some(number) => format!("{number:.decimals$}%"),
        None => display_text(value),
    }
}

/// Grouped fixed-decimal number; non-numeric input is returned unchanged.
pub fn format_number(value: &Value, decimals: usize) -> String {
    match numeric_value(value) {
        Some(number) => grouped(number, decimals),
        None => display_text(value),
    }
}

/// Short locale-style date (`Dec 26, 2025`); unparsable input is returned
/// unchanged. Numbers are read as unix milliseconds, matching the source
/// timestamps the classifier tags.
pub fn format_date(value: &Value) -> String {
    match value {
        Value::String(text) => parse_date_text(text)
            .map(|date_time| short_date(&date_time))
            .unwrap_or_else(|| text.clone()),
        Value::Number(number) => number
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|date_time| short_date(&date_time.naive_utc()))
            .unwrap_or_else(|| display_text(value)),
        other => display_text(other),
    }
}

fn short_date(date_time: &NaiveDateTime) -> String {
    date_time.format("%b %-d, %Y").to_string()
}

fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.naive_utc());
    }
    for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y%m%dT%H%M%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return Some(parsed);
        }
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return parsed.and_hms_opt(0, 0, 0);
    }

    // 10/13-digit unix timestamps persisted as strings
    if trimmed.len() == 10 && trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return DateTime::from_timestamp(trimmed.parse().ok()?, 0).map(|parsed| parsed.naive_utc());
    }
    if trimmed.len() == 13 && trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return DateTime::from_timestamp_millis(trimmed.parse().ok()?).map(|parsed| parsed.naive_utc());
    }

    None
}

/// Numeric reading of a value: raw numbers directly, strings through a
/// longest-valid-prefix parse (so `"5.2%"` reads as `5.2`, the tolerance the
/// original interface had).
fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) if !text.trim().is_empty() => parse_float_prefix(text),
        _ => None,
    }
}

fn parse_float_prefix(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let mut saw_digit = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        saw_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            saw_digit = true;
        }
    }
    if !saw_digit {
        return None;
    }

    // optional exponent; only consumed when complete
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exponent_end = end + 1;
        if exponent_end < bytes.len() && matches!(bytes[exponent_end], b'+' | b'-') {
            exponent_end += 1;
        }
        let digits_start = exponent_end;
        while exponent_end < bytes.len() && bytes[exponent_end].is_ascii_digit() {
            exponent_end += 1;
        }
        if exponent_end > digits_start {
            end = exponent_end;
        }
    }

    trimmed[..end].parse::<f64>().ok().filter(|number| number.is_finite())
}

fn grouped(number: f64, decimals: usize) -> String {
    group_digits(&format!("{number:.decimals$}"))
}

/// Insert thousands separators into a fixed-decimal numeric string.
fn group_digits(fixed: &str) -> String {
    let (sign, magnitude) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed),
    };
    let (integer, fraction) = match magnitude.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (magnitude, None),
    };

    let mut grouped_integer = String::with_capacity(integer.len() + integer.len() / 3);
    for (offset, digit) in integer.chars().enumerate() {
        if offset > 0 && (integer.len() - offset) % 3 == 0 {
            grouped_integer.push(',');
        }
        grouped_integer.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{sign}{grouped_integer}.{fraction}"),
        None => format!("{sign}{grouped_integer}"),
    }
}

fn display_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
