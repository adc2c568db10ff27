//! Shared data model for the Dashwire workspace.
//!
//! These types travel between the engine (field extraction/resolution), the
//! store (persisted dashboard configuration), the registry (templates), and
//! the CLI. Serialized field names are camelCase so configurations written
//! by earlier builds of the dashboard load unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Refined type tag attached to an extracted field.
///
/// Mirrors the runtime-type refinement of the field catalog: raw numbers are
/// `Number`, timestamp/percentage scalars are coerced to `String`, and a
/// `null` leaf carries `Object` (the runtime type `null` reports).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Number,
    String,
    Boolean,
    Object,
    Array,
}

impl FieldKind {
    /// Runtime-type tag for a raw JSON value, before classifier refinement.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Bool(_) => Self::Boolean,
            Value::Array(_) => Self::Array,
            Value::Null | Value::Object(_) => Self::Object,
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        })
    }
}

/// One addressable scalar leaf inside a JSON document.
///
/// `path` is the synthetic underscore-joined address produced by the
/// flattener; no escaping is applied, so a literal `_` inside a key is
/// indistinguishable from a separator. The resolver absorbs that ambiguity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Synthetic address of the leaf (e.g. `feed_0_title`).
    pub path: String,
    /// Refined type tag.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Leaf value, coerced to a string copy for timestamps/percentages.
    pub value: Value,
}

/// Display formatting requested for a selected field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatHint {
    #[default]
    Auto,
    Currency,
    Percentage,
    Number,
    Date,
}

/// A field the user picked for a widget during configuration.
///
/// Created against a sample document, persisted with the widget, and read
/// on every refresh; the resolver never mutates it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectedField {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub value: Value,
    /// Optional display label; falls back to the last path segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Formatting hint; `auto` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FormatHint>,
}

impl SelectedField {
    /// Label shown next to the value: the explicit label when present,
    /// otherwise the final path segment.
    pub fn display_label(&self) -> &str {
        if let Some(label) = &self.label
            && !label.is_empty()
        {
            return label;
        }
        self.path.rsplit(['_', '.']).next().unwrap_or(&self.path)
    }

    /// Formatting hint with the `auto` default applied.
    pub fn format_hint(&self) -> FormatHint {
        self.format.unwrap_or_default()
    }
}

/// How a widget presents its resolved fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Card,
    Table,
    Chart,
}

/// A configured dashboard widget bound to one API endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    /// Store-assigned identifier (millisecond timestamp as a string).
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Endpoint the widget polls.
    pub api_url: String,
    /// Refresh period in seconds; `None` disables polling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<u64>,
    #[serde(default)]
    pub display_mode: DisplayMode,
    #[serde(default)]
    pub selected_fields: Vec<SelectedField>,
    /// Response-cache max age in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_max_age: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Widget {
    /// Cache max-age with the 30-second default applied.
    pub fn cache_max_age_ms(&self) -> u64 {
        self.cache_max_age.unwrap_or(30_000)
    }
}

/// Dashboard color theme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

/// The persisted dashboard document: `{ "widgets": [...], "theme": "dark" }`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub theme: Theme,
}
