//! Workspace wiring
//!
//! A workspace is a base directory holding `src/`, `patches/`, `configs/`
//! and `backups/` plus an optional `fpm.toml`. [`Workspace::open`] resolves
//! the layout and mapping table once and hands out the components built
//! from them.

use fpm_fs::{Layout, NormalizedPath};

use crate::Result;
use crate::applier::GitApplier;
use crate::artifact::ArtifactStore;
use crate::authoring::PatchAuthor;
use crate::backup::BackupVault;
use crate::category::Category;
use crate::config::ToolSettings;
use crate::ledger::ApplicationLedger;
use crate::orchestrator::Orchestrator;

/// File name of the configuration template in the configs directory.
pub const TEMPLATE_FILE: &str = "template.json";

#[derive(Debug, Clone)]
pub struct Workspace {
    layout: Layout,
    settings: ToolSettings,
    store: ArtifactStore,
}

impl Workspace {
    /// Load settings from `base` and resolve the layout and mapping table.
    pub fn open(base: NormalizedPath) -> Result<Self> {
        let settings = ToolSettings::load_or_default(&base)?;
        let layout = settings.layout(base);
        let store = ArtifactStore::new(layout.patches().clone(), settings.mapping_table()?);
        tracing::debug!(base = %layout.base(), src = %layout.src(), "Opened workspace");
        Ok(Self {
            layout,
            settings,
            store,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn vault(&self) -> BackupVault {
        BackupVault::new(self.layout.src().clone(), self.layout.backups().clone())
    }

    pub fn ledger(&self) -> ApplicationLedger {
        ApplicationLedger::new(self.layout.configs().clone())
    }

    pub fn applier(&self) -> GitApplier {
        GitApplier::new(self.layout.src().clone())
            .with_git(self.settings.apply.git.clone())
            .with_extra_args(self.settings.apply.extra_args.clone())
    }

    pub fn orchestrator(&self) -> Orchestrator<GitApplier> {
        Orchestrator::new(
            self.layout.src().clone(),
            self.store.clone(),
            self.vault(),
            self.applier(),
            self.ledger(),
        )
    }

    pub fn author(&self) -> PatchAuthor<'_> {
        PatchAuthor::new(&self.store, self.layout.src())
    }

    /// Create the catalogue, config and backup directories and one
    /// directory per category. Returns what was newly created.
    pub fn create_structure(&self) -> Result<Vec<NormalizedPath>> {
        let created = self
            .layout
            .ensure_structure(Category::ALL.iter().map(Category::as_str))?;
        if !self.layout.src().is_dir() {
            tracing::warn!(src = %self.layout.src(), "Source directory does not exist");
        }
        Ok(created)
    }

    pub fn template_path(&self) -> NormalizedPath {
        self.layout.configs().join(TEMPLATE_FILE)
    }

    /// Default location of a generated configuration.
    pub fn fingerprint_path(&self, id: &str) -> NormalizedPath {
        self.layout.configs().join(&format!("fingerprint_{id}.json"))
    }
}
