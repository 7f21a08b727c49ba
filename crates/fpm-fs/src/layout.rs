//! Workspace layout
//!
//! A patch workspace is a base directory holding the source tree being
//! patched alongside the patch catalogue, the configuration/ledger directory
//! and the backup vault:
//!
//! ```text
//! <base>/
//!   src/        working source tree
//!   patches/    <category>/<mode>_<name>_<basename>.patch
//!   configs/    configuration documents and ledger sessions
//!   backups/    pristine copies of modified files
//! ```

use std::fs;

use crate::{Error, NormalizedPath, Result};

/// The directories that make up a patch workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutDir {
    /// Working source tree that patches are applied to
    Src,
    /// Patch artifact catalogue, one subdirectory per category
    Patches,
    /// Configuration documents and ledger sessions
    Configs,
    /// Backup vault
    Backups,
}

impl LayoutDir {
    /// All layout directories in creation order.
    pub const ALL: [LayoutDir; 4] = [
        LayoutDir::Src,
        LayoutDir::Patches,
        LayoutDir::Configs,
        LayoutDir::Backups,
    ];

    /// Default directory name relative to the workspace base.
    pub fn default_name(&self) -> &'static str {
        match self {
            Self::Src => "src",
            Self::Patches => "patches",
            Self::Configs => "configs",
            Self::Backups => "backups",
        }
    }
}

impl std::fmt::Display for LayoutDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.default_name())
    }
}

/// Resolved absolute locations of every workspace directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    base: NormalizedPath,
    src: NormalizedPath,
    patches: NormalizedPath,
    configs: NormalizedPath,
    backups: NormalizedPath,
}

impl Layout {
    /// Layout with default directory names under `base`.
    pub fn new(base: NormalizedPath) -> Self {
        Self {
            src: base.join(LayoutDir::Src.default_name()),
            patches: base.join(LayoutDir::Patches.default_name()),
            configs: base.join(LayoutDir::Configs.default_name()),
            backups: base.join(LayoutDir::Backups.default_name()),
            base,
        }
    }

    /// Relocate one directory. Relative values are resolved against the base.
    pub fn with_dir(mut self, dir: LayoutDir, location: &str) -> Self {
        let resolved = if std::path::Path::new(location).is_absolute() {
            NormalizedPath::new(location)
        } else {
            self.base.join(location)
        };
        match dir {
            LayoutDir::Src => self.src = resolved,
            LayoutDir::Patches => self.patches = resolved,
            LayoutDir::Configs => self.configs = resolved,
            LayoutDir::Backups => self.backups = resolved,
        }
        self
    }

    pub fn base(&self) -> &NormalizedPath {
        &self.base
    }

    /// Absolute location of a layout directory.
    pub fn dir(&self, dir: LayoutDir) -> &NormalizedPath {
        match dir {
            LayoutDir::Src => &self.src,
            LayoutDir::Patches => &self.patches,
            LayoutDir::Configs => &self.configs,
            LayoutDir::Backups => &self.backups,
        }
    }

    pub fn src(&self) -> &NormalizedPath {
        &self.src
    }

    pub fn patches(&self) -> &NormalizedPath {
        &self.patches
    }

    pub fn configs(&self) -> &NormalizedPath {
        &self.configs
    }

    pub fn backups(&self) -> &NormalizedPath {
        &self.backups
    }

    /// Directory holding artifacts for one category.
    pub fn category_dir(&self, category: &str) -> NormalizedPath {
        self.patches.join(category)
    }

    /// Create the catalogue, config and backup directories plus one
    /// directory per category. The source tree is never created here.
    ///
    /// Returns the directories that did not exist before.
    pub fn ensure_structure<'a>(
        &self,
        categories: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<NormalizedPath>> {
        let mut wanted = vec![
            self.patches.clone(),
            self.configs.clone(),
            self.backups.clone(),
        ];
        wanted.extend(categories.into_iter().map(|c| self.category_dir(c)));

        let mut created = Vec::new();
        for dir in wanted {
            if dir.is_dir() {
                continue;
            }
            fs::create_dir_all(dir.to_native()).map_err(|e| Error::io(dir.to_native(), e))?;
            tracing::debug!(dir = %dir, "Created directory");
            created.push(dir);
        }
        Ok(created)
    }

    /// True when the catalogue directory exists.
    pub fn is_initialized(&self) -> bool {
        self.patches.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_layout_uses_conventional_names() {
        let layout = Layout::new(NormalizedPath::new("/work"));
        assert_eq!(layout.src().as_str(), "/work/src");
        assert_eq!(layout.patches().as_str(), "/work/patches");
        assert_eq!(layout.configs().as_str(), "/work/configs");
        assert_eq!(layout.backups().as_str(), "/work/backups");
        assert_eq!(layout.category_dir("timezone").as_str(), "/work/patches/timezone");
    }

    #[test]
    fn with_dir_resolves_relative_and_absolute() {
        let layout = Layout::new(NormalizedPath::new("/work"))
            .with_dir(LayoutDir::Src, "chromium/src")
            .with_dir(LayoutDir::Backups, "/var/fpm/backups");
        assert_eq!(layout.src().as_str(), "/work/chromium/src");
        assert_eq!(layout.backups().as_str(), "/var/fpm/backups");
    }

    #[test]
    fn ensure_structure_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let layout = Layout::new(NormalizedPath::new(temp.path()));

        let created = layout.ensure_structure(["timezone", "canvas"]).unwrap();
        assert_eq!(created.len(), 5);
        assert!(layout.is_initialized());
        assert!(layout.category_dir("canvas").is_dir());
        assert!(!layout.src().exists());

        let again = layout.ensure_structure(["timezone", "canvas"]).unwrap();
        assert!(again.is_empty());
    }
}
