//! Resolving synthetic field paths against live documents.
//!
//! Paths are `_`-joined tokens with no reserved-character escaping, so one
//! literal path can map to different real structures: a key that itself
//! contains `_`, a numeric index vs. a numeric-named key, a multi-word key
//! fragmented by the join. Resolution therefore runs a layered, increasingly
//! permissive sequence of strategies and commits to the first definite hit,
//! which keeps lookups deterministic for paths produced by the flattener.
//!
//! Every failure mode is `None` — the resolver never panics and never
//! returns an error value.

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde_json::{Map, Value};

/// `key[idx]` and bare `[idx]` token shapes.
static BRACKET_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^\[]*)\[(\d+)\]$").expect("valid regex"));

/// Candidate separators for token-merge recovery, tried in order.
const MERGE_SEPARATORS: &[&str] = &["_", ".", " "];

/// Resolve `path` inside `doc`, returning the addressed sub-value.
///
/// Strategies, in priority order, short-circuiting on the first hit:
///
/// 1. trivial — empty, `root`, or `.` addresses the document itself;
/// 2. the whole path as one literal top-level key (keys that legitimately
///    contain `_` win outright);
/// 3. the whole path URL-decoded, for paths persisted with percent-escaped
///    spaces or parentheses;
/// 4. `name_INDEX[_rest]` where `name` is a top-level array — the common
///    one-array-hop shape (`feed_0_title`);
/// 5. general tokenization with bracket-index support, insertion-order
///    indexing into plain objects, and token-merge recovery for keys the
///    underscore join fragmented.
///
/// Out-of-range or malformed indices and missing keys all yield `None`.
pub fn get_nested_value<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim();
    if path.is_empty() || path == "root" || path == "." {
        return Some(doc);
    }

    if let Value::Object(map) = doc {
        if let Some(found) = map.get(path) {
            return Some(found);
        }

        if let Ok(decoded) = percent_decode_str(path).decode_utf8()
            && decoded != path
            && let Some(found) = map.get(decoded.as_ref())
        {
            return Some(found);
        }

        if let Some(result) = array_index_shortcut(map, path) {
            return result;
        }
    }

    walk_tokens(doc, path)
}

/// Strategy 4: `name_INDEX` / `name_INDEX_rest` against a top-level array.
///
/// Scans underscore positions left to right for a digits-only segment; the
/// first position whose preceding text names an array key commits the
/// strategy, so `Some(None)` means "matched, but the index or the rest of
/// the path does not resolve".
fn array_index_shortcut<'a>(map: &'a Map<String, Value>, path: &str) -> Option<Option<&'a Value>> {
    for (position, _) in path.match_indices('_') {
        if position == 0 {
            continue;
        }
        let (name, after) = (&path[..position], &path[position + 1..]);
        let (digits, rest) = match after.split_once('_') {
            Some((digits, rest)) => (digits, Some(rest)),
            None => (after, None),
        };
        let Ok(index) = digits.parse::<usize>() else {
            continue;
        };
        let Some(Value::Array(items)) = map.get(name) else {
            continue;
        };

        let element = items.get(index);
        return Some(match rest {
            Some(rest) => element.and_then(|element| get_nested_value(element, rest)),
            None => element,
        });
    }
    None
}

/// Strategy 5: token-by-token walk with recovery.
fn walk_tokens<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let tokens = tokenize(path);
    let mut current = doc;
    let mut cursor = 0;

    while cursor < tokens.len() {
        let token = tokens[cursor];

        if let Some(captures) = BRACKET_TOKEN.captures(token) {
            let key = captures.get(1).map_or("", |m| m.as_str());
            let index = captures.get(2)?.as_str().parse::<usize>().ok()?;
            if !key.trim().is_empty() {
                current = lookup_key(current, key)?;
            }
            current = index_into(current, index)?;
            cursor += 1;
            continue;
        }

        match current {
            Value::Object(map) => {
                if let Some(found) = map.get(token).or_else(|| map.get(token.trim())) {
                    current = found;
                    cursor += 1;
                    continue;
                }
                let (found, consumed_through) = merge_tokens(map, &tokens, cursor)?;
                current = found;
                cursor = consumed_through + 1;
            }
            Value::Array(items) => {
                let index = token.trim().parse::<usize>().ok()?;
                current = items.get(index)?;
                cursor += 1;
            }
            _ => return None,
        }
    }

    Some(current)
}

/// Split a path on `_`, keeping bracketed segments like `items[0]` whole.
fn tokenize(path: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, ch) in path.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '_' if depth == 0 => {
                tokens.push(&path[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    tokens.push(&path[start..]);
    tokens.retain(|token| !token.is_empty());
    tokens
}

/// Exact key lookup with a whitespace-trimmed fallback.
fn lookup_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let Value::Object(map) = value else {
        return None;
    };
    map.get(key).or_else(|| map.get(key.trim()))
}

/// Positional indexing: arrays by offset, plain objects by the idx-th
/// insertion-order entry (shape tolerance for object-wrapped series).
fn index_into(value: &Value, index: usize) -> Option<&Value> {
    match value {
        Value::Array(items) => items.get(index),
        Value::Object(map) => map.values().nth(index),
        _ => None,
    }
}

/// Token-merge recovery: progressively rejoin the token at `start` with the
/// tokens after it, testing `_`, `.`, and space joins (and their trimmed
/// forms) as literal keys. Returns the match and the index of the last token
/// it consumed.
fn merge_tokens<'a>(map: &'a Map<String, Value>, tokens: &[&str], start: usize) -> Option<(&'a Value, usize)> {
    for end in (start + 1)..tokens.len() {
        for separator in MERGE_SEPARATORS {
            let candidate = tokens[start..=end].join(separator);
            if let Some(found) = map.get(candidate.as_str()).or_else(|| map.get(candidate.trim())) {
                return Some((found, end));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trivial_paths_address_the_document() {
        let doc = json!({"a": 1});
        assert_eq!(get_nested_value(&doc, ""), Some(&doc));
        assert_eq!(get_nested_value(&doc, "root"), Some(&doc));
        assert_eq!(get_nested_value(&doc, "."), Some(&doc));
        assert_eq!(get_nested_value(&doc, "  root  "), Some(&doc));
    }

    #[test]
    fn whole_path_key_beats_tokenization() {
        // A key containing underscores resolves at highest priority even
        // though splitting would also succeed against other shapes.
        let doc = json!({
            "change_percent": "1.2%",
            "change": {"percent": "9.9%"}
        });
        assert_eq!(get_nested_value(&doc, "change_percent"), Some(&json!("1.2%")));
    }

    #[test]
    fn url_encoded_paths_decode_to_literal_keys() {
        let doc = json!({"Time Series (5min)": {"volume": 9}});
        let series = get_nested_value(&doc, "Time%20Series%20%285min%29").unwrap();
        assert_eq!(series, &json!({"volume": 9}));
    }

    #[test]
    fn single_array_hop_with_nested_rest() {
        let doc = json!({"feed": [{"title": "a"}, {"title": "b"}]});
        assert_eq!(get_nested_value(&doc, "feed_0_title"), Some(&json!("a")));
        assert_eq!(get_nested_value(&doc, "feed_1_title"), Some(&json!("b")));
    }

    #[test]
    fn array_hop_without_rest_returns_the_element() {
        let doc = json!({"values": [10, 20, 30]});
        assert_eq!(get_nested_value(&doc, "values_2"), Some(&json!(30)));
    }

    #[test]
    fn deep_array_nesting_round_trips() {
        let doc = json!({"feed": [{"authors": ["x", "y"]}]});
        assert_eq!(get_nested_value(&doc, "feed_0_authors_1"), Some(&json!("y")));

        let matrix = json!({"m": [[1, 2], [3, 4]]});
        assert_eq!(get_nested_value(&matrix, "m_1_0"), Some(&json!(3)));
    }

    #[test]
    fn out_of_range_and_negative_indices_miss() {
        let doc = json!({"a": [1, 2]});
        assert_eq!(get_nested_value(&doc, "a_5"), None);
        assert_eq!(get_nested_value(&doc, "a[5]"), None);
        assert_eq!(get_nested_value(&doc, "a[-1]"), None);
    }

    #[test]
    fn missing_keys_miss() {
        assert_eq!(get_nested_value(&json!({}), "x_y_z"), None);
        assert_eq!(get_nested_value(&json!({"x": {"y": 1}}), "x_q"), None);
        assert_eq!(get_nested_value(&json!(17), "x"), None);
    }

    #[test]
    fn token_merge_recovers_multi_word_keys() {
        let doc = json!({
            "Time Series (5min)": {
                "2025-12-26 19:55:00": {"1. open": 304.91}
            }
        });
        let path = "Time Series (5min)_2025-12-26 19:55:00_1. open";
        assert_eq!(get_nested_value(&doc, path), Some(&json!(304.91)));
    }

    #[test]
    fn token_merge_rejoins_underscore_keys_below_the_root() {
        let doc = json!({"meta": {"last_refreshed": "2025-12-26"}});
        assert_eq!(
            get_nested_value(&doc, "meta_last_refreshed"),
            Some(&json!("2025-12-26"))
        );
    }

    #[test]
    fn token_merge_recovers_space_joined_keys() {
        let doc = json!({"Global Quote": {"price": 1.5}});
        assert_eq!(get_nested_value(&doc, "Global_Quote_price"), Some(&json!(1.5)));
    }

    #[test]
    fn bracket_tokens_index_arrays_and_objects() {
        let doc = json!({"items": [{"name": "first"}, {"name": "second"}]});
        assert_eq!(
            get_nested_value(&doc, "items[1]_name"),
            Some(&json!("second"))
        );

        // object-as-array: positional indexing by insertion order
        let series = json!({"days": {"2025-01-02": 5, "2025-01-01": 7}});
        assert_eq!(get_nested_value(&series, "days[1]"), Some(&json!(7)));
    }

    #[test]
    fn malformed_bracket_indices_miss() {
        let doc = json!({"items": [1, 2]});
        assert_eq!(get_nested_value(&doc, "items[one]"), None);
        assert_eq!(get_nested_value(&doc, "items[]"), None);
    }

    #[test]
    fn numeric_named_keys_win_over_positional_indexing() {
        let doc = json!({"rows": {"0": "named", "first": "positional"}});
        assert_eq!(get_nested_value(&doc, "rows_0"), Some(&json!("named")));
    }

    #[test]
    fn resolution_is_idempotent() {
        let doc = json!({"feed": [{"title": "a"}]});
        let first = get_nested_value(&doc, "feed_0_title");
        let second = get_nested_value(&doc, "feed_0_title");
        assert_eq!(first, second);
    }

    #[test]
    fn trimmed_key_fallback() {
        let doc = json!({"padded": {" value ": 3}});
        // exact token misses, trimmed comparison cannot invent padding
        assert_eq!(get_nested_value(&doc, "padded_value"), None);

        let doc = json!({"quote": {"price": 3}});
        assert_eq!(get_nested_value(&doc, "quote_ price "), Some(&json!(3)));
    }
}
