//! Tool settings loaded from `fpm.toml`

use std::collections::BTreeMap;

use fpm_fs::{ConfigStore, Layout, LayoutDir, NormalizedPath};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::category::{Category, MappingTable};

/// Settings file name looked up in the workspace base directory.
pub const SETTINGS_FILE: &str = "fpm.toml";

fn default_git() -> String {
    "git".to_string()
}

/// Directory overrides. Unset entries keep their conventional names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutSettings {
    pub src: Option<String>,
    pub patches: Option<String>,
    pub configs: Option<String>,
    pub backups: Option<String>,
}

/// How patches are applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplySettings {
    /// Git executable used for `git apply`
    #[serde(default = "default_git")]
    pub git: String,
    /// Extra arguments appended after the built-in `git apply` flags
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for ApplySettings {
    fn default() -> Self {
        Self {
            git: default_git(),
            extra_args: Vec::new(),
        }
    }
}

/// Contents of `fpm.toml`.
///
/// ```toml
/// [layout]
/// src = "chromium/src"
///
/// [apply]
/// git = "/usr/bin/git"
///
/// [mappings]
/// timezone = ["base/time/time.cc"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub apply: ApplySettings,
    /// Per-category replacement of the default target-file list
    #[serde(default)]
    pub mappings: BTreeMap<String, Vec<String>>,
}

impl ToolSettings {
    /// Load `fpm.toml` from `base`, falling back to defaults when absent.
    pub fn load_or_default(base: &NormalizedPath) -> Result<Self> {
        let path = base.join(SETTINGS_FILE);
        if !path.is_file() {
            tracing::debug!(path = %path, "No settings file, using defaults");
            return Ok(Self::default());
        }
        let settings: ToolSettings = ConfigStore::new().load(&path)?;
        tracing::debug!(path = %path, "Loaded settings");
        Ok(settings)
    }

    /// Resolve the workspace layout under `base`.
    pub fn layout(&self, base: NormalizedPath) -> Layout {
        let overrides = [
            (LayoutDir::Src, &self.layout.src),
            (LayoutDir::Patches, &self.layout.patches),
            (LayoutDir::Configs, &self.layout.configs),
            (LayoutDir::Backups, &self.layout.backups),
        ];
        overrides
            .into_iter()
            .fold(Layout::new(base), |layout, (dir, value)| match value {
                Some(location) => layout.with_dir(dir, location),
                None => layout,
            })
    }

    /// Build the mapping table: Chromium defaults with per-category overrides.
    ///
    /// Unlike configuration documents, an unknown category here is an error:
    /// a typo in the tool settings would otherwise silently patch nothing.
    pub fn mapping_table(&self) -> Result<MappingTable> {
        let mut table = MappingTable::chromium();
        for (name, files) in &self.mappings {
            let category: Category = name.parse()?;
            table = table.with_targets(category, files)?;
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = ToolSettings::load_or_default(&NormalizedPath::new(temp.path())).unwrap();
        assert_eq!(settings, ToolSettings::default());
        assert_eq!(settings.apply.git, "git");
    }

    #[test]
    fn loads_layout_apply_and_mappings() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(SETTINGS_FILE),
            r#"
[layout]
src = "chromium/src"

[apply]
extra_args = ["--verbose"]

[mappings]
timezone = ["base/time/time.cc"]
"#,
        )
        .unwrap();
        let base = NormalizedPath::new(temp.path());

        let settings = ToolSettings::load_or_default(&base).unwrap();
        let layout = settings.layout(base.clone());
        let table = settings.mapping_table().unwrap();

        assert_eq!(layout.src(), &base.join("chromium/src"));
        assert_eq!(layout.patches(), &base.join("patches"));
        assert_eq!(settings.apply.git, "git");
        assert_eq!(settings.apply.extra_args, vec!["--verbose".to_string()]);
        assert_eq!(table.targets(Category::Timezone), ["base/time/time.cc".to_string()]);
    }

    #[test]
    fn unknown_mapping_category_is_an_error() {
        let mut settings = ToolSettings::default();
        settings.mappings.insert("timezones".into(), vec!["a.cc".into()]);
        assert!(matches!(
            settings.mapping_table(),
            Err(Error::UnknownCategory { .. })
        ));
    }
}
