//! Shared helpers for the Dashwire CLI: the persisted dashboard store and
//! small path utilities.

pub mod store;

use std::path::PathBuf;

use dirs_next::home_dir;

pub use store::{DashboardStore, StoreError};

/// Expand a leading `~` in a user-supplied path.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    if trimmed == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = trimmed.strip_prefix("~/") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    if let Some(rest) = trimmed.strip_prefix("~\\") {
        // Windows-style
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(trimmed)
}
