//! Built-in dashboard template catalog.
//!
//! Templates bundle preconfigured widgets a user can apply as a starting
//! point instead of wiring endpoints by hand. The catalog ships embedded in
//! the binary and is parsed once at load.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use dashwire_types::Widget;

/// JSON manifest embedded at build time.
const EMBEDDED_TEMPLATES: &str = include_str!("../templates.json");

/// A named, ready-to-apply set of widgets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Icon hint for pickers (`cards`, `table`, `chart`).
    pub icon: String,
    pub widgets: Vec<Widget>,
}

/// The loaded template catalog.
#[derive(Clone, Debug, Default)]
pub struct TemplateCatalog {
    pub templates: Vec<Template>,
}

impl TemplateCatalog {
    /// Parse the embedded manifest.
    pub fn from_embedded() -> Result<Self> {
        let templates: Vec<Template> =
            serde_json::from_str(EMBEDDED_TEMPLATES).context("parse embedded template manifest")?;
        Ok(Self { templates })
    }

    /// Look a template up by its identifier.
    pub fn template_by_id(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|template| template.id == id)
    }
}
