//! Fingerprint configuration documents
//!
//! A configuration selects, per category, whether patches are applied and in
//! which mode. Documents are JSON:
//!
//! ```json
//! {
//!   "id": "3f0c…",
//!   "created_at": "2025-03-01T10:20:30+00:00",
//!   "settings": {
//!     "timezone": { "enabled": true, "mode": "custom", "params": { "timezone": "Asia/Tokyo" } }
//!   }
//! }
//! ```
//!
//! `fingerprint_id` and `creation_time` are accepted as aliases for `id` and
//! `created_at`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use fpm_fs::{NormalizedPath, io};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::category::Category;
use crate::{Error, Result};

/// Mode value meaning "leave this category untouched".
pub const DEFAULT_MODE: &str = "default";

fn default_enabled() -> bool {
    true
}

fn default_mode() -> String {
    DEFAULT_MODE.to_string()
}

/// Per-category selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySetting {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl CategorySetting {
    /// An enabled setting in the given mode with no params.
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            enabled: true,
            mode: mode.into(),
            params: Map::new(),
        }
    }

    /// Builder-style param insertion.
    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Whether this setting selects any patches.
    pub fn is_active(&self) -> bool {
        self.enabled && self.mode != DEFAULT_MODE
    }
}

impl Default for CategorySetting {
    fn default() -> Self {
        Self::new(DEFAULT_MODE)
    }
}

/// A validated fingerprint configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FingerprintConfig {
    pub id: String,
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
    /// Informational generation mode (`random`, `fixed`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint_mode: Option<String>,
    pub settings: BTreeMap<Category, CategorySetting>,
}

/// Shape of the document before category keys are validated.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(alias = "fingerprint_id")]
    id: String,
    #[serde(alias = "creation_time")]
    created_at: String,
    #[serde(default)]
    fingerprint_mode: Option<String>,
    #[serde(default)]
    settings: Map<String, Value>,
}

impl FingerprintConfig {
    /// A configuration with a fresh id, the current time and no settings.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            fingerprint_mode: None,
            settings: BTreeMap::new(),
        }
    }

    /// Builder-style setting insertion.
    pub fn with_setting(mut self, category: Category, setting: CategorySetting) -> Self {
        self.settings.insert(category, setting);
        self
    }

    /// Parse and validate a JSON document.
    ///
    /// Unknown category keys are dropped with a warning. The whole document is
    /// rejected only when it is structurally corrupt: not JSON, missing `id`
    /// or `created_at`, an unusable id, or a setting that is not an object of
    /// the expected shape.
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(content).map_err(|e| Error::InvalidConfig {
            message: e.to_string(),
        })?;

        validate_id(&raw.id)?;

        let created_at =
            crate::timestamp::parse(&raw.created_at).ok_or_else(|| Error::InvalidConfig {
                message: format!("invalid created_at timestamp '{}'", raw.created_at),
            })?;

        let mut settings = BTreeMap::new();
        for (key, value) in raw.settings {
            let Ok(category) = key.parse::<Category>() else {
                tracing::warn!(category = %key, "Ignoring unknown category in configuration");
                continue;
            };
            let setting: CategorySetting =
                serde_json::from_value(value).map_err(|e| Error::InvalidConfig {
                    message: format!("settings.{key}: {e}"),
                })?;
            settings.insert(category, setting);
        }

        Ok(Self {
            id: raw.id,
            created_at,
            fingerprint_mode: raw.fingerprint_mode,
            settings,
        })
    }

    /// Load a configuration document from disk.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ConfigNotFound {
                path: path.to_native(),
            });
        }
        let content = io::read_text(path)?;
        Self::parse(&content)
    }

    /// Save as pretty-printed JSON, atomically.
    pub fn save(&self, path: &NormalizedPath) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        io::write_text(path, &content)?;
        Ok(())
    }

    /// Settings that select patches, in catalogue order.
    pub fn active_settings(&self) -> impl Iterator<Item = (Category, &CategorySetting)> {
        self.settings
            .iter()
            .filter(|(_, setting)| setting.is_active())
            .map(|(category, setting)| (*category, setting))
    }

    /// Categories present but not selecting anything.
    pub fn inactive_categories(&self) -> Vec<Category> {
        self.settings
            .iter()
            .filter(|(_, setting)| !setting.is_active())
            .map(|(category, _)| *category)
            .collect()
    }
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Ids become part of ledger file names.
fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidConfig {
            message: "id must not be empty".to_string(),
        });
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        || id.starts_with('.')
    {
        return Err(Error::InvalidConfig {
            message: format!("id '{id}' may only contain letters, digits, '-', '_' and '.'"),
        });
    }
    Ok(())
}
