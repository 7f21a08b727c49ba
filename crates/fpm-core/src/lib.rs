//! Patch orchestration engine for the fingerprint patch manager
//!
//! Applies a selected subset of unified-diff patch artifacts to a Chromium
//! source tree according to a fingerprint configuration, records exactly
//! what was applied, and restores the tree to its pristine state later.
//!
//! - **Artifact store**: locates the patch for a (category, mode, target)
//! - **Backup vault**: keeps the pristine content of every modified file
//! - **Patch applier**: applies one artifact to one file via `git apply`
//! - **Application ledger**: append-only log of apply sessions
//! - **Orchestrator**: drives apply and restore over the four above
//!
//! # Architecture
//!
//! ```text
//!                      fpm-cli
//!                         |
//!                      fpm-core
//!                         |
//!                       fpm-fs
//! ```
//!
//! # Example
//!
//! ```ignore
//! use fpm_core::{FingerprintConfig, Workspace};
//! use fpm_fs::NormalizedPath;
//!
//! let workspace = Workspace::open(NormalizedPath::new("/work/chromium"))?;
//! let config = FingerprintConfig::load(&workspace.template_path())?;
//! let report = workspace.orchestrator().apply(&config)?;
//! ```

pub mod applier;
pub mod artifact;
pub mod authoring;
pub mod backup;
pub mod category;
pub mod config;
pub mod error;
pub mod generator;
pub mod ledger;
pub mod orchestrator;
pub mod timestamp;
pub mod workspace;

pub use applier::{ApplyError, GitApplier, PatchApplier};
pub use artifact::{ArtifactStore, PatchArtifact};
pub use authoring::{PatchAuthor, PatchRequest, render_patch};
pub use backup::{BackupEntry, BackupVault};
pub use category::{Category, MappingTable};
pub use config::{CategorySetting, DEFAULT_MODE, FingerprintConfig, ToolSettings};
pub use error::{Error, Result};
pub use generator::{FingerprintGenerator, Overrides, template_config};
pub use ledger::{ApplicationLedger, ApplicationRecord, ApplicationSession, SessionState};
pub use orchestrator::{
    ApplyReport, FailureKind, FileFailure, Orchestrator, OrchestratorState, RestoreReport,
    SkippedTarget,
};
pub use workspace::Workspace;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn error_config_not_found_displays_path() {
        let error = Error::ConfigNotFound {
            path: PathBuf::from("/work/configs/missing.json"),
        };
        assert!(error.to_string().contains("/work/configs/missing.json"));
    }

    #[test]
    fn fs_errors_convert_transparently() {
        let fs_error = fpm_fs::Error::LockFailed {
            path: PathBuf::from("/work/configs/.ledger.lock"),
        };
        let error: Error = fs_error.into();
        assert!(matches!(error, Error::Fs(_)));
        assert!(error.to_string().contains(".ledger.lock"));
    }
}
