//! Persisted dashboard configuration.
//!
//! A small JSON-backed store holding the widget list and theme — the
//! `{ "widgets": [...], "theme": "dark" }` document the dashboard has always
//! persisted. The file lives in the standard configuration directory
//! (`~/.config/dashwire/dashboard.json` on most platforms) and is safe to
//! use from multiple threads thanks to the internal `Mutex`. A corrupt file
//! degrades to the default configuration rather than failing startup.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use dirs_next::config_dir;
use thiserror::Error;
use tracing::warn;

use dashwire_types::{DashboardConfig, Theme, Widget};

use crate::expand_tilde;

/// Environment variable allowing callers to override the config file path.
pub const CONFIG_PATH_ENV: &str = "DASHWIRE_CONFIG_PATH";

/// Default filename for the persisted dashboard.
pub const CONFIG_FILE_NAME: &str = "dashboard.json";

/// Error surfaced when reading or writing the dashboard file fails.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O failure (for example, permissions or missing directory).
    #[error("dashboard store I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization or deserialization failure.
    #[error("dashboard store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Thread-safe dashboard store backed by a JSON file.
#[derive(Debug, Default)]
pub struct DashboardStore {
    path: PathBuf,
    config: Mutex<DashboardConfig>,
    persist_to_disk: bool,
}

impl DashboardStore {
    /// Open the store at the default (or env-overridden) location.
    pub fn new() -> Result<Self, StoreError> {
        Self::at_path(default_config_path())
    }

    /// Open a store rooted at an explicit path.
    pub fn at_path(path: PathBuf) -> Result<Self, StoreError> {
        let config = load_config(&path)?;
        Ok(Self {
            path,
            config: Mutex::new(config),
            persist_to_disk: true,
        })
    }

    /// Build an in-memory store that never touches disk.
    pub fn ephemeral() -> Self {
        Self::default()
    }

    /// Path to the underlying JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the whole configuration.
    pub fn config(&self) -> DashboardConfig {
        self.config.lock().expect("store lock poisoned").clone()
    }

    /// Snapshot of the widget list.
    pub fn widgets(&self) -> Vec<Widget> {
        self.config.lock().expect("store lock poisoned").widgets.clone()
    }

    pub fn theme(&self) -> Theme {
        self.config.lock().expect("store lock poisoned").theme
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), StoreError> {
        let mut config = self.config.lock().expect("store lock poisoned");
        config.theme = theme;
        self.save_locked(&config)
    }

    /// Add a widget, assigning it a millisecond-timestamp id and creation
    /// time. Returns the assigned id.
    pub fn add_widget(&self, mut widget: Widget) -> Result<String, StoreError> {
        let now = Utc::now();
        let mut config = self.config.lock().expect("store lock poisoned");

        // Bump the millisecond stamp until it is unique; template applies
        // add several widgets inside one tick.
        let mut stamp = now.timestamp_millis();
        while config.widgets.iter().any(|existing| existing.id == stamp.to_string()) {
            stamp += 1;
        }
        widget.id = stamp.to_string();
        widget.created_at = Some(now.to_rfc3339());

        let id = widget.id.clone();
        config.widgets.push(widget);
        self.save_locked(&config)?;
        Ok(id)
    }

    /// Remove a widget by id. Returns whether anything was removed.
    pub fn remove_widget(&self, id: &str) -> Result<bool, StoreError> {
        let mut config = self.config.lock().expect("store lock poisoned");
        let before = config.widgets.len();
        config.widgets.retain(|widget| widget.id != id);
        let removed = config.widgets.len() != before;
        if removed {
            self.save_locked(&config)?;
        }
        Ok(removed)
    }

    /// Apply an in-place update to the widget with the given id. Returns
    /// whether the widget existed.
    pub fn update_widget(&self, id: &str, apply: impl FnOnce(&mut Widget)) -> Result<bool, StoreError> {
        let mut config = self.config.lock().expect("store lock poisoned");
        let Some(widget) = config.widgets.iter_mut().find(|widget| widget.id == id) else {
            return Ok(false);
        };
        apply(widget);
        self.save_locked(&config)?;
        Ok(true)
    }

    /// Move the widget at `from` to position `to`, shifting the rest.
    pub fn move_widget(&self, from: usize, to: usize) -> Result<bool, StoreError> {
        let mut config = self.config.lock().expect("store lock poisoned");
        if from >= config.widgets.len() || to >= config.widgets.len() {
            return Ok(false);
        }
        let widget = config.widgets.remove(from);
        config.widgets.insert(to, widget);
        self.save_locked(&config)?;
        Ok(true)
    }

    pub fn clear_widgets(&self) -> Result<(), StoreError> {
        let mut config = self.config.lock().expect("store lock poisoned");
        config.widgets.clear();
        self.save_locked(&config)
    }

    /// Pretty-printed `{widgets, theme}` document for sharing.
    pub fn export_config(&self) -> Result<String, StoreError> {
        let config = self.config.lock().expect("store lock poisoned");
        Ok(serde_json::to_string_pretty(&*config)?)
    }

    /// Replace the configuration with an exported document. Absent fields
    /// fall back to their defaults.
    pub fn import_config(&self, content: &str) -> Result<(), StoreError> {
        let imported: DashboardConfig = serde_json::from_str(content)?;
        let mut config = self.config.lock().expect("store lock poisoned");
        *config = imported;
        self.save_locked(&config)
    }

    fn save_locked(&self, config: &DashboardConfig) -> Result<(), StoreError> {
        if !self.persist_to_disk {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dashwire")
        .join(CONFIG_FILE_NAME)
}

fn load_config(path: &Path) -> Result<DashboardConfig, StoreError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(config) => Ok(config),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse dashboard file; using defaults"
                );
                Ok(DashboardConfig::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(DashboardConfig::default()),
        Err(error) => Err(StoreError::Io(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashwire_types::DisplayMode;
    use tempfile::tempdir;

    fn sample_widget(name: &str) -> Widget {
        Widget {
            id: String::new(),
            name: name.to_string(),
            api_url: "https://example.com/data".to_string(),
            refresh_interval: Some(60),
            display_mode: DisplayMode::Card,
            selected_fields: Vec::new(),
            cache_max_age: Some(30_000),
            created_at: None,
        }
    }

    #[test]
    fn widgets_persist_across_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dashboard.json");

        let store = DashboardStore::at_path(path.clone()).unwrap();
        let id = store.add_widget(sample_widget("Quotes")).unwrap();
        store.set_theme(Theme::Light).unwrap();
        drop(store);

        let reloaded = DashboardStore::at_path(path).unwrap();
        let widgets = reloaded.widgets();
        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets[0].id, id);
        assert_eq!(widgets[0].name, "Quotes");
        assert!(widgets[0].created_at.is_some());
        assert_eq!(reloaded.theme(), Theme::Light);
    }

    #[test]
    fn corrupt_file_degrades_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        fs::write(&path, "not json").unwrap();

        let store = DashboardStore::at_path(path).unwrap();
        assert!(store.widgets().is_empty());
        assert_eq!(store.theme(), Theme::Dark);
    }

    #[test]
    fn remove_and_update_by_id() {
        let store = DashboardStore::ephemeral();
        let id = store.add_widget(sample_widget("a")).unwrap();

        assert!(store.update_widget(&id, |widget| widget.name = "renamed".into()).unwrap());
        assert_eq!(store.widgets()[0].name, "renamed");

        assert!(!store.update_widget("nope", |_| {}).unwrap());
        assert!(store.remove_widget(&id).unwrap());
        assert!(!store.remove_widget(&id).unwrap());
        assert!(store.widgets().is_empty());
    }

    #[test]
    fn move_widget_reorders() {
        let store = DashboardStore::ephemeral();
        store.add_widget(sample_widget("first")).unwrap();
        store.add_widget(sample_widget("second")).unwrap();
        store.add_widget(sample_widget("third")).unwrap();

        assert!(store.move_widget(2, 0).unwrap());
        let names: Vec<_> = store.widgets().into_iter().map(|widget| widget.name).collect();
        assert_eq!(names, vec!["third", "first", "second"]);

        assert!(!store.move_widget(0, 9).unwrap());
    }

    #[test]
    fn export_import_round_trips() {
        let store = DashboardStore::ephemeral();
        store.add_widget(sample_widget("kept")).unwrap();
        store.set_theme(Theme::Light).unwrap();
        let exported = store.export_config().unwrap();

        let other = DashboardStore::ephemeral();
        other.import_config(&exported).unwrap();
        assert_eq!(other.config(), store.config());

        assert!(other.import_config("{ broken").is_err());
        // failed import leaves the previous configuration in place
        assert_eq!(other.widgets().len(), 1);
    }

    #[test]
    fn default_path_honors_env_override() {
        temp_env::with_var(CONFIG_PATH_ENV, Some("~/custom/dashboard.json"), || {
            let path = default_config_path();
            assert_eq!(path, expand_tilde("~/custom/dashboard.json"));
        });
    }

    #[test]
    fn clear_widgets_empties_the_list() {
        let store = DashboardStore::ephemeral();
        store.add_widget(sample_widget("a")).unwrap();
        store.add_widget(sample_widget("b")).unwrap();
        store.clear_widgets().unwrap();
        assert!(store.widgets().is_empty());
    }
}
