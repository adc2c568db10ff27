//! Terminal rendering for dashboard widgets.
//!
//! Stands in for the dashboard's visual widget layer: each widget resolves
//! its selected fields against the latest fetched document and renders as a
//! card (label/value rows), a table (array rows with derived columns), or a
//! chart (sparklines over a numeric series). Resolution misses always render
//! as `N/A`; nothing here fails.

use serde_json::Value;
use unicode_width::UnicodeWidthStr;

use dashwire_engine::{auto_format, get_nested_value};
use dashwire_types::{DisplayMode, FormatHint, SelectedField, Widget};

/// Array keys probed, in order, when a table widget's document is not itself
/// an array and the selected fields do not name one.
const PRIORITY_ARRAY_KEYS: &[&str] = &[
    "data",
    "feed",
    "top_gainers",
    "top_losers",
    "most_actively_traded",
    "results",
    "items",
];

/// Array keys probed for a chart's backing series.
const SERIES_ARRAY_KEYS: &[&str] = &["timeSeries", "values", "data", "series", "history", "feed"];

/// Rows shown per table render, matching the dashboard's page size.
const TABLE_PAGE_SIZE: usize = 10;

const SPARKLINE_LEVELS: &[char] = &['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render one widget against its freshly fetched document.
pub fn render_widget(widget: &Widget, doc: &Value) -> String {
    match widget.display_mode {
        DisplayMode::Card => render_card(widget, doc),
        DisplayMode::Table => render_table(widget, doc),
        DisplayMode::Chart => render_chart(widget, doc),
    }
}

fn render_card(widget: &Widget, doc: &Value) -> String {
    if widget.selected_fields.is_empty() {
        return "No fields selected. Configure the widget to select fields.\n".to_string();
    }

    let rows: Vec<(String, String)> = widget
        .selected_fields
        .iter()
        .map(|field| {
            let formatted = match get_nested_value(doc, &field.path) {
                Some(value) => auto_format(value, field.format_hint()),
                None => "N/A".to_string(),
            };
            (field.display_label().to_string(), formatted)
        })
        .collect();

    let label_width = rows.iter().map(|(label, _)| label.width()).max().unwrap_or(0);
    let mut out = String::new();
    for (label, value) in rows {
        out.push_str(&format!("  {label:<label_width$}  {value}\n", label = label));
    }
    out
}

// ---------------------------------------------------------------------------
// tables

struct Column {
    /// Path resolved inside each row; empty means the row itself.
    property_path: String,
    label: String,
    format: FormatHint,
}

fn render_table(widget: &Widget, doc: &Value) -> String {
    let (rows, array_key) = locate_rows(doc, &widget.selected_fields);
    if rows.is_empty() {
        return "No array data found. Make sure your API returns an array or select array fields.\n".to_string();
    }

    let columns = derive_columns(&widget.selected_fields, &rows, array_key.as_deref());
    if columns.is_empty() {
        return "No columns to display. Select fields inside the array rows.\n".to_string();
    }

    let mut grid: Vec<Vec<String>> = vec![columns.iter().map(|column| column.label.clone()).collect()];
    for row in rows.iter().take(TABLE_PAGE_SIZE) {
        grid.push(
            columns
                .iter()
                .map(|column| {
                    let cell = if column.property_path.is_empty() {
                        Some(*row)
                    } else {
                        get_nested_value(row, &column.property_path)
                    };
                    match cell {
                        Some(value) => summarize_cell(value, column.format),
                        None => "N/A".to_string(),
                    }
                })
                .collect(),
        );
    }

    let widths: Vec<usize> = (0..columns.len())
        .map(|index| grid.iter().map(|row| row[index].width()).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for (row_index, row) in grid.iter().enumerate() {
        out.push_str("  ");
        for (cell, width) in row.iter().zip(&widths) {
            out.push_str(&format!("{cell:<width$}  ", width = *width));
        }
        out.push('\n');
        if row_index == 0 {
            out.push_str("  ");
            for width in &widths {
                out.push_str(&"-".repeat(*width));
                out.push_str("  ");
            }
            out.push('\n');
        }
    }
    if rows.len() > TABLE_PAGE_SIZE {
        out.push_str(&format!("  ... {} more rows\n", rows.len() - TABLE_PAGE_SIZE));
    }
    out
}

/// Locate the array backing a table widget: the document itself, the array
/// named by the selected fields' path prefix, a priority key, or the first
/// array found within three levels.
fn locate_rows<'a>(doc: &'a Value, fields: &[SelectedField]) -> (Vec<&'a Value>, Option<String>) {
    if let Value::Array(items) = doc {
        return (items.iter().collect(), None);
    }

    if let Value::Object(map) = doc
        && let Some(first_path) = fields.first().map(|field| field.path.as_str())
    {
        if let Some(prefix) = first_path.split('_').next()
            && let Some(Value::Array(items)) = map.get(prefix)
        {
            return (items.iter().collect(), Some(prefix.to_string()));
        }
        for (key, value) in map {
            if let Value::Array(items) = value {
                let normalized = normalize_key(key);
                if first_path.starts_with(&format!("{normalized}_")) || first_path.starts_with(&format!("{key}_")) {
                    return (items.iter().collect(), Some(key.clone()));
                }
            }
        }
    }

    if let Value::Object(map) = doc {
        for key in PRIORITY_ARRAY_KEYS {
            if let Some(Value::Array(items)) = map.get(*key) {
                return (items.iter().collect(), Some((*key).to_string()));
            }
        }
    }

    match find_array(doc, None, 0) {
        Some((items, key)) => (items.iter().collect(), key),
        None => (Vec::new(), None),
    }
}

fn find_array<'a>(value: &'a Value, key: Option<&str>, depth: usize) -> Option<(&'a Vec<Value>, Option<String>)> {
    if depth > 3 {
        return None;
    }
    match value {
        Value::Array(items) => Some((items, key.map(str::to_string))),
        Value::Object(map) => map
            .iter()
            .find_map(|(child_key, child)| find_array(child, Some(child_key), depth + 1)),
        _ => None,
    }
}

/// Derive table columns from the selected fields, stripping the array key
/// and row index from each path so the remainder resolves inside a row.
/// Without selected fields the first row's own keys become the columns.
fn derive_columns(fields: &[SelectedField], rows: &[&Value], array_key: Option<&str>) -> Vec<Column> {
    if !fields.is_empty() {
        return fields
            .iter()
            .filter_map(|field| {
                let (property_path, derived_label) = match array_key {
                    Some(key) => match row_property_path(&field.path, key)? {
                        RowPath::Property(path) => {
                            let label = title_case(&path.replace('_', " "));
                            (path, label)
                        }
                        RowPath::WholeRow => (String::new(), key.to_string()),
                    },
                    None => {
                        let label = field.path.rsplit('_').next().unwrap_or("Field").to_string();
                        (field.path.clone(), label)
                    }
                };
                let label = field.label.clone().filter(|label| !label.is_empty()).unwrap_or(derived_label);
                Some(Column {
                    property_path,
                    label,
                    format: field.format_hint(),
                })
            })
            .collect();
    }

    match rows.first() {
        Some(Value::Object(map)) => map
            .keys()
            .map(|key| Column {
                property_path: key.clone(),
                label: title_case(&key.replace('_', " ")),
                format: FormatHint::Auto,
            })
            .collect(),
        _ => Vec::new(),
    }
}

enum RowPath {
    Property(String),
    WholeRow,
}

/// Strip `{array_key}_{index}_` (normalized or literal) from a selected
/// path. `None` drops the field from the table entirely — it addresses
/// something outside the backing array.
fn row_property_path(path: &str, array_key: &str) -> Option<RowPath> {
    let normalized = normalize_key(array_key);
    if path == array_key || path == normalized {
        return Some(RowPath::WholeRow);
    }

    let remaining = path
        .strip_prefix(&format!("{normalized}_"))
        .or_else(|| path.strip_prefix(&format!("{array_key}_")))?;

    let mut segments = remaining.split('_');
    let first = segments.next()?;
    if first.parse::<usize>().is_ok() {
        let rest: Vec<&str> = segments.collect();
        if rest.is_empty() {
            return Some(RowPath::WholeRow);
        }
        return Some(RowPath::Property(rest.join("_")));
    }
    Some(RowPath::Property(remaining.to_string()))
}

/// Key form used inside flattened paths: whitespace runs become `_` and
/// parentheses are dropped.
fn normalize_key(key: &str) -> String {
    key.split_whitespace().collect::<Vec<_>>().join("_").replace(['(', ')'], "")
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format a table cell, compressing containers into short summaries.
fn summarize_cell(value: &Value, format: FormatHint) -> String {
    match value {
        Value::Array(items) if items.is_empty() => "N/A".to_string(),
        Value::Array(items) => {
            if items.iter().all(|item| item.is_string() || item.is_number()) {
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            } else if items.iter().all(Value::is_object) && items.len() <= 3 {
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| object_summary(item).unwrap_or_else(|| format!("Item {}", index + 1)))
                    .collect::<Vec<_>>()
                    .join(", ")
            } else {
                format!("{} items", items.len())
            }
        }
        Value::Object(_) => object_summary(value).unwrap_or_else(|| {
            let text = value.to_string();
            if text.chars().count() > 50 {
                format!("{}...", text.chars().take(50).collect::<String>())
            } else {
                text
            }
        }),
        other => auto_format(other, format),
    }
}

/// Prefer a recognizable member when summarizing an object cell.
fn object_summary(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    for key in ["topic", "ticker", "executive"] {
        if let Some(Value::String(text)) = map.get(key) {
            return Some(text.clone());
        }
    }
    None
}

// ---------------------------------------------------------------------------
// charts

fn render_chart(widget: &Widget, doc: &Value) -> String {
    let numeric_fields: Vec<&SelectedField> = widget
        .selected_fields
        .iter()
        .filter(|field| resolve_numeric_field(doc, field).is_some())
        .collect();
    if numeric_fields.is_empty() {
        return "No chart data available. Select numeric fields to display.\n".to_string();
    }

    let series = extract_series(doc, &numeric_fields);
    if series.iter().all(|(_, points)| points.is_empty()) {
        return "No chart data available. Select numeric fields to display.\n".to_string();
    }

    let label_width = series.iter().map(|(label, _)| label.width()).max().unwrap_or(0);
    let mut out = String::new();
    for (label, points) in &series {
        let line = sparkline(points);
        let last = points.last().copied().unwrap_or(0.0);
        out.push_str(&format!(
            "  {label:<label_width$}  {line}  (last {last})\n",
            label = label
        ));
    }
    out
}

/// A field charts when it resolves to a finite number, directly or through
/// the `_`/`.` separator swap used by older persisted paths.
fn resolve_numeric_field(doc: &Value, field: &SelectedField) -> Option<f64> {
    if let Some(value) = get_nested_value(doc, &field.path) {
        return numeric_point(value);
    }
    for alternate in [field.path.replace('_', "."), field.path.replace('.', "_")] {
        if alternate != field.path
            && let Some(value) = get_nested_value(doc, &alternate)
            && let Some(number) = numeric_point(value)
        {
            return Some(number);
        }
    }
    None
}

/// Build one numeric series per field from whatever series shape the
/// document offers: a root array, a recognized array key, a time-series
/// map keyed by timestamps, or a single resolved point.
fn extract_series(doc: &Value, fields: &[&SelectedField]) -> Vec<(String, Vec<f64>)> {
    let field_label = |field: &SelectedField| {
        field
            .label
            .clone()
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| field.path.clone())
    };

    if let Value::Array(items) = doc {
        return fields
            .iter()
            .map(|field| {
                let points = items
                    .iter()
                    .map(|item| {
                        get_nested_value(item, &field.path)
                            .and_then(numeric_point)
                            .unwrap_or(0.0)
                    })
                    .collect();
                (field_label(field), points)
            })
            .collect();
    }

    if let Value::Object(map) = doc {
        for key in SERIES_ARRAY_KEYS {
            if let Some(Value::Array(items)) = map.get(*key) {
                return fields
                    .iter()
                    .map(|field| {
                        let property_path = array_item_path(&field.path, key);
                        let points = items
                            .iter()
                            .map(|item| {
                                get_nested_value(item, &property_path)
                                    .or_else(|| get_nested_value(item, &field.path))
                                    .and_then(numeric_point)
                                    .unwrap_or(0.0)
                            })
                            .collect();
                        (field_label(field), points)
                    })
                    .collect();
            }
        }

        for (key, value) in map {
            if is_time_series_key(key)
                && let Value::Object(entries) = value
            {
                let mut timestamps: Vec<&String> = entries.keys().collect();
                timestamps.sort();
                timestamps.reverse();

                return fields
                    .iter()
                    .map(|field| {
                        let points = timestamps
                            .iter()
                            .filter_map(|timestamp| entries.get(*timestamp))
                            .map(|entry| {
                                let property_path = series_entry_path(&field.path, key, entries);
                                get_nested_value(entry, &property_path)
                                    .or_else(|| get_nested_value(entry, &field.path))
                                    .and_then(numeric_point)
                                    .unwrap_or(0.0)
                            })
                            .collect();
                        (field_label(field), points)
                    })
                    .collect();
            }
        }
    }

    // single data point per field
    fields
        .iter()
        .map(|field| {
            let points = resolve_numeric_field(doc, field).map(|number| vec![number]).unwrap_or_default();
            (field_label(field), points)
        })
        .collect()
}

/// Strip `{key}_{index}_` from a path so it resolves inside one array item.
fn array_item_path(path: &str, key: &str) -> String {
    if let Some(remaining) = path.strip_prefix(&format!("{key}_")) {
        let mut segments = remaining.split('_');
        if let Some(first) = segments.next()
            && first.parse::<usize>().is_ok()
        {
            let rest: Vec<&str> = segments.collect();
            if !rest.is_empty() {
                return rest.join("_");
            }
        }
        return remaining.replace('_', ".");
    }
    path.to_string()
}

/// Strip `...{key}_{timestamp}_` from a path so it resolves inside one
/// time-series entry.
fn series_entry_path(path: &str, key: &str, entries: &serde_json::Map<String, Value>) -> String {
    if !path.contains(key) {
        return path.to_string();
    }
    let parts: Vec<&str> = path.split('_').collect();
    let Some(key_index) = parts.iter().position(|part| part.contains(key) || is_time_series_key(part)) else {
        return path.to_string();
    };
    if parts.len() > key_index + 1 {
        if entries.contains_key(parts[key_index + 1]) {
            return parts[key_index + 2..].join("_");
        }
        return parts[key_index + 1..].join("_");
    }
    path.to_string()
}

fn is_time_series_key(key: &str) -> bool {
    let collapsed = key.to_lowercase().replace([' ', '-', '_'], "");
    collapsed.contains("timeseries")
}

fn numeric_point(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64().filter(|number| number.is_finite()),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed.contains('%') || trimmed.contains('T') || looks_like_iso_date(trimmed) {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|number| number.is_finite())
        }
        _ => None,
    }
}

fn looks_like_iso_date(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit)
}

fn sparkline(points: &[f64]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let min = points.iter().copied().fold(f64::INFINITY, f64::min);
    let max = points.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    points
        .iter()
        .map(|point| {
            let level = if span == 0.0 {
                0
            } else {
                (((point - min) / span) * (SPARKLINE_LEVELS.len() - 1) as f64).round() as usize
            };
            SPARKLINE_LEVELS[level.min(SPARKLINE_LEVELS.len() - 1)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashwire_types::FieldKind;
    use serde_json::json;

    fn field(path: &str, label: Option<&str>) -> SelectedField {
        SelectedField {
            path: path.to_string(),
            kind: FieldKind::Number,
            value: json!(0),
            label: label.map(str::to_string),
            format: None,
        }
    }

    fn widget(mode: DisplayMode, fields: Vec<SelectedField>) -> Widget {
        Widget {
            id: "1".into(),
            name: "test".into(),
            api_url: "https://example.com".into(),
            refresh_interval: None,
            display_mode: mode,
            selected_fields: fields,
            cache_max_age: None,
            created_at: None,
        }
    }

    #[test]
    fn card_renders_values_and_misses() {
        let doc = json!({"Global Quote": {"05. price": "304.9100"}});
        let widget = widget(
            DisplayMode::Card,
            vec![
                field("Global Quote_05. price", Some("Price")),
                field("Global Quote_99. missing", None),
            ],
        );
        let out = render_widget(&widget, &doc);
        assert!(out.contains("Price"));
        assert!(out.contains("304.91"));
        assert!(out.contains("N/A"));
    }

    #[test]
    fn table_derives_columns_from_array_fields() {
        let doc = json!({"feed": [
            {"title": "a", "source": "x"},
            {"title": "b", "source": "y"}
        ]});
        let widget = widget(
            DisplayMode::Table,
            vec![field("feed_0_title", None), field("feed_0_source", None)],
        );
        let out = render_widget(&widget, &doc);
        assert!(out.contains("Title"));
        assert!(out.contains("Source"));
        assert!(out.contains('a'));
        assert!(out.contains('y'));
    }

    #[test]
    fn table_without_fields_uses_row_keys() {
        let doc = json!({"data": [{"symbol": "IBM", "shares": 1000}]});
        let widget = widget(DisplayMode::Table, Vec::new());
        let out = render_widget(&widget, &doc);
        assert!(out.contains("Symbol"));
        assert!(out.contains("IBM"));
        assert!(out.contains("1,000.00"));
    }

    #[test]
    fn table_reports_missing_arrays() {
        let doc = json!({"only": "scalars"});
        let widget = widget(DisplayMode::Table, Vec::new());
        assert!(render_widget(&widget, &doc).contains("No array data found"));
    }

    #[test]
    fn chart_builds_series_from_time_series_map() {
        let doc = json!({
            "Time Series (5min)": {
                "2025-12-26 19:50:00": {"1. open": "304.64"},
                "2025-12-26 19:55:00": {"1. open": "304.91"}
            }
        });
        let widget = widget(
            DisplayMode::Chart,
            vec![field("Time Series (5min)_2025-12-26 19:55:00_1. open", Some("Open"))],
        );
        let out = render_widget(&widget, &doc);
        assert!(out.contains("Open"));
        // two timestamps -> two sparkline cells
        assert!(out.contains('█') || out.contains('▁'));
    }

    #[test]
    fn chart_requires_numeric_fields() {
        let doc = json!({"note": "text only"});
        let widget = widget(DisplayMode::Chart, vec![field("note", None)]);
        assert!(render_widget(&widget, &doc).contains("No chart data available"));
    }

    #[test]
    fn row_property_paths_strip_key_and_index() {
        assert!(matches!(
            row_property_path("feed_0_title", "feed"),
            Some(RowPath::Property(path)) if path == "title"
        ));
        assert!(matches!(
            row_property_path("Time_Series_5min_0_1. open", "Time Series (5min)"),
            Some(RowPath::Property(path)) if path == "1. open"
        ));
        assert!(matches!(row_property_path("feed", "feed"), Some(RowPath::WholeRow)));
        assert!(row_property_path("other_0_title", "feed").is_none());
    }

    #[test]
    fn cell_summaries_compress_containers() {
        assert_eq!(summarize_cell(&json!(["a", "b"]), FormatHint::Auto), "a, b");
        assert_eq!(summarize_cell(&json!([]), FormatHint::Auto), "N/A");
        assert_eq!(
            summarize_cell(&json!([{"topic": "Earnings"}, {"topic": "IPO"}]), FormatHint::Auto),
            "Earnings, IPO"
        );
        assert_eq!(
            summarize_cell(&json!([1, 2, {"x": 1}, null, true]), FormatHint::Auto),
            "5 items"
        );
        assert_eq!(summarize_cell(&json!({"ticker": "IBM"}), FormatHint::Auto), "IBM");
    }

    #[test]
    fn sparkline_scales_to_range() {
        let line = sparkline(&[1.0, 2.0, 3.0]);
        assert_eq!(line.chars().count(), 3);
        assert!(line.starts_with('▁'));
        assert!(line.ends_with('█'));
        assert_eq!(sparkline(&[5.0, 5.0]), "▁▁");
    }
}
