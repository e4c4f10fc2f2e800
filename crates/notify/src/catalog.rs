//! Alert template catalog.
//!
//! Maps an alert kind (e.g. `new_target`) to its [`AlertTemplate`]. The
//! catalog is loaded once at process start, either from the builtin YAML
//! shipped with this crate or from an operator-authored file, and is
//! immutable afterwards.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;
use vigil_core::Severity;

use crate::payload::AlertContext;
use crate::templating::render;
use crate::traits::NotifyError;

const BUILTIN_CATALOG: &str = include_str!("../catalog/builtin.yaml");

/// Well-known alert kinds shipped in the builtin catalog.
pub mod kinds {
    pub const NEW_TARGET: &str = "new_target";
    pub const HANDOFF_SUCCESS: &str = "handoff_success";
    pub const TARGET_LOST: &str = "target_lost";
    pub const ZONE_BREACH: &str = "zone_breach";
    pub const SUSPICIOUS_PERSON: &str = "suspicious_person";
    pub const LOITERING: &str = "loitering";
    pub const CROWD_GATHERING: &str = "crowd_gathering";
    pub const CAMERA_OFFLINE: &str = "camera_offline";
}

/// Sample placeholder set used for previews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateExample {
    pub situation: String,
    #[serde(default)]
    pub placeholders: AlertContext,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertTemplate {
    /// Catalog key the dispatcher looks up.
    pub kind: String,
    /// Stable short code.
    pub id: String,
    pub severity: Severity,
    pub short_message: String,
    pub long_message: String,
    /// Suggested operator actions, in display order.
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub examples: Vec<TemplateExample>,
}

/// Immutable registry of alert templates keyed by kind.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<AlertTemplate>,
    index: HashMap<String, usize>,
}

impl TemplateCatalog {
    /// Build a catalog, rejecting duplicate kinds and blank messages.
    pub fn new(templates: Vec<AlertTemplate>) -> Result<Self, NotifyError> {
        let mut index = HashMap::with_capacity(templates.len());
        for (pos, tpl) in templates.iter().enumerate() {
            if tpl.kind.trim().is_empty() {
                return Err(NotifyError::Config(format!(
                    "template '{}' has an empty kind",
                    tpl.id
                )));
            }
            if tpl.short_message.trim().is_empty() || tpl.long_message.trim().is_empty() {
                return Err(NotifyError::Config(format!(
                    "template '{}' has an empty message",
                    tpl.kind
                )));
            }
            if index.insert(tpl.kind.clone(), pos).is_some() {
                return Err(NotifyError::Config(format!(
                    "duplicate alert kind '{}'",
                    tpl.kind
                )));
            }
        }
        Ok(Self { templates, index })
    }

    /// The catalog shipped with this crate.
    pub fn builtin() -> Result<Self, NotifyError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, NotifyError> {
        let templates: Vec<AlertTemplate> = serde_yaml::from_str(yaml)?;
        Self::new(templates)
    }

    pub fn from_file(path: &Path) -> Result<Self, NotifyError> {
        let contents = fs::read_to_string(path)?;
        let catalog = Self::from_yaml_str(&contents)?;
        info!(path = %path.display(), templates = catalog.len(), "loaded alert catalog");
        Ok(catalog)
    }

    pub fn lookup(&self, kind: &str) -> Option<&AlertTemplate> {
        self.index.get(kind).map(|&pos| &self.templates[pos])
    }

    /// Catalog keys in authoring order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.kind.as_str())
    }

    /// Render a template against one of its own examples as `(short, long)`.
    pub fn preview(&self, kind: &str, example_index: usize) -> Option<(String, String)> {
        let tpl = self.lookup(kind)?;
        let example = tpl.examples.get(example_index)?;
        Some((
            render(&tpl.short_message, &example.placeholders),
            render(&tpl.long_message, &example.placeholders),
        ))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
