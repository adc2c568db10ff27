//! Flattening a JSON document into an addressable field catalog.
//!
//! The flattener walks a document depth-first and emits one descriptor per
//! scalar leaf, each addressed by an underscore-joined synthetic path.
//! Containers never appear as leaves themselves. The resulting catalog is
//! what the configuration flow presents as the field picker.

use dashwire_types::{FieldDescriptor, FieldKind};
use serde_json::{Map, Value};

use crate::classify::{is_percentage, is_timestamp, is_timestamp_key, scalar_text};

/// Flatten `value` into an ordered sequence of scalar leaf descriptors.
///
/// Paths are built by joining traversal steps with `_`: object steps use the
/// literal key, array steps the decimal index. No escaping is applied, so a
/// key containing `_` produces a path indistinguishable from a deeper
/// traversal — the resolver's layered matching absorbs that on the way back.
///
/// Ordering is depth-first pre-order and deterministic for a given input.
/// `null` and empty containers contribute no leaves; a scalar root emits a
/// single leaf addressed `root` (or the prefix when one is given).
pub fn extract_fields(value: &Value, prefix: &str) -> Vec<FieldDescriptor> {
    let mut fields = Vec::new();
    collect_fields(value, prefix, &mut fields);
    fields
}

fn collect_fields(value: &Value, prefix: &str, fields: &mut Vec<FieldDescriptor>) {
    match value {
        Value::Null => {}
        Value::Array(items) => collect_array_items(items, prefix, fields),
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = join_path(prefix, key);
                match child {
                    Value::Array(items) => collect_array_items(items, &child_path, fields),
                    Value::Object(nested) if is_time_series_map(nested) => {
                        // A date-indexed series would explode the catalog;
                        // only the first entry's fields are selectable.
                        if let Some((first_key, first_value)) = nested.iter().next() {
                            collect_fields(first_value, &join_path(&child_path, first_key), fields);
                        }
                    }
                    Value::Object(_) => collect_fields(child, &child_path, fields),
                    scalar => push_leaf(child_path, key, scalar, fields),
                }
            }
        }
        scalar => {
            let path = if prefix.is_empty() { "root".to_string() } else { prefix.to_string() };
            fields.push(FieldDescriptor {
                path,
                kind: FieldKind::of(scalar),
                value: scalar.clone(),
            });
        }
    }
}

/// Flatten the elements of an array rooted at `array_path`.
///
/// Container elements recurse with the indexed path as their prefix; scalar
/// elements emit one leaf whose classifier key is the final path token.
fn collect_array_items(items: &[Value], array_path: &str, fields: &mut Vec<FieldDescriptor>) {
    for (index, item) in items.iter().enumerate() {
        let item_path = join_path(array_path, &index.to_string());
        match item {
            Value::Object(_) | Value::Array(_) => collect_fields(item, &item_path, fields),
            scalar => {
                let item_key = item_path.rsplit('_').next().unwrap_or_default().to_string();
                push_leaf(item_path, &item_key, scalar, fields);
            }
        }
    }
}

/// Emit one scalar leaf, refining its type tag through the classifier.
///
/// Timestamps and percentages are stored as string copies so they are never
/// numerically reformatted downstream; raw numbers stay numbers.
fn push_leaf(path: String, key: &str, value: &Value, fields: &mut Vec<FieldDescriptor>) {
    let descriptor = if is_timestamp(value, key) || is_percentage(value, key) {
        FieldDescriptor {
            path,
            kind: FieldKind::String,
            value: Value::String(scalar_text(value)),
        }
    } else {
        FieldDescriptor {
            path,
            kind: FieldKind::of(value),
            value: value.clone(),
        }
    };
    fields.push(descriptor);
}

/// Returns true when every key of a non-empty object reads as a timestamp —
/// the shape of a date-indexed time-series map.
fn is_time_series_map(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|key| is_timestamp_key(key))
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}_{segment}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(fields: &[FieldDescriptor]) -> Vec<&str> {
        fields.iter().map(|field| field.path.as_str()).collect()
    }

    #[test]
    fn scalar_root_is_addressed_root() {
        let fields = extract_fields(&json!(42.5), "");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].path, "root");
        assert_eq!(fields[0].kind, FieldKind::Number);
        assert_eq!(fields[0].value, json!(42.5));
    }

    #[test]
    fn null_and_empty_containers_yield_nothing() {
        assert!(extract_fields(&json!(null), "").is_empty());
        assert!(extract_fields(&json!([]), "").is_empty());
        assert!(extract_fields(&json!({}), "").is_empty());
        assert!(extract_fields(&json!({"empty": [], "hollow": {}}), "").is_empty());
    }

    #[test]
    fn arrays_of_objects_flatten_with_indexed_paths() {
        let doc = json!({"feed": [{"title": "a"}, {"title": "b"}]});
        let fields = extract_fields(&doc, "");
        assert_eq!(paths(&fields), vec!["feed_0_title", "feed_1_title"]);
        assert_eq!(fields[0].value, json!("a"));
        assert_eq!(fields[1].value, json!("b"));
    }

    #[test]
    fn array_root_and_nested_arrays() {
        let fields = extract_fields(&json!([1, [2, 3], {"x": 4}]), "");
        assert_eq!(paths(&fields), vec!["0", "1_0", "1_1", "2_x"]);
        assert_eq!(fields[3].value, json!(4));
    }

    #[test]
    fn emission_order_is_depth_first_pre_order() {
        let doc = json!({
            "a": {"b": 1, "c": {"d": 2}},
            "e": 3
        });
        let fields = extract_fields(&doc, "");
        assert_eq!(paths(&fields), vec!["a_b", "a_c_d", "e"]);

        // deterministic: a second run emits the identical sequence
        assert_eq!(fields, extract_fields(&doc, ""));
    }

    #[test]
    fn timestamps_and_percentages_become_strings() {
        let doc = json!({
            "latest trading day": "2025-12-26",
            "time_published": 1735200000,
            "change_percent": 1.23,
            "price": 304.91
        });
        let fields = extract_fields(&doc, "");

        let by_path = |path: &str| fields.iter().find(|field| field.path == path).unwrap();
        assert_eq!(by_path("latest trading day").kind, FieldKind::String);
        let stamped = by_path("time_published");
        assert_eq!(stamped.kind, FieldKind::String);
        assert_eq!(stamped.value, json!("1735200000"));
        assert_eq!(by_path("change_percent").value, json!("1.23"));

        let price = by_path("price");
        assert_eq!(price.kind, FieldKind::Number);
        assert_eq!(price.value, json!(304.91));
    }

    #[test]
    fn null_leaves_keep_object_kind() {
        let fields = extract_fields(&json!({"gap": null}), "");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].kind, FieldKind::Object);
        assert_eq!(fields[0].value, Value::Null);
    }

    #[test]
    fn time_series_map_collapses_to_first_entry() {
        let doc = json!({
            "Time Series (5min)": {
                "2025-01-02 10:00:00": {"1. open": 1.0},
                "2025-01-01 09:00:00": {"1. open": 2.0}
            }
        });
        let fields = extract_fields(&doc, "");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].path, "Time Series (5min)_2025-01-02 10:00:00_1. open");
        assert_eq!(fields[0].value, json!(1.0));
    }

    #[test]
    fn ordinary_nested_objects_do_not_collapse() {
        let doc = json!({
            "quote": {"open": 1.0, "close": 2.0}
        });
        let fields = extract_fields(&doc, "");
        assert_eq!(paths(&fields), vec!["quote_open", "quote_close"]);
    }

    #[test]
    fn prefix_seeds_every_emitted_path() {
        let fields = extract_fields(&json!({"price": 1}), "nested");
        assert_eq!(paths(&fields), vec!["nested_price"]);

        let fields = extract_fields(&json!("lone"), "nested");
        assert_eq!(paths(&fields), vec!["nested"]);
    }

    #[test]
    fn mixed_type_array_elements() {
        let doc = json!({"grab": ["2025-12-26", 17, true, null]});
        let fields = extract_fields(&doc, "");
        assert_eq!(paths(&fields), vec!["grab_0", "grab_1", "grab_2", "grab_3"]);
        // date-shaped string element stringifies through the classifier
        assert_eq!(fields[0].kind, FieldKind::String);
        assert_eq!(fields[1].kind, FieldKind::Number);
        assert_eq!(fields[2].kind, FieldKind::Boolean);
        assert_eq!(fields[3].kind, FieldKind::Object);
    }
}
