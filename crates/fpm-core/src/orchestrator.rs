//! Apply and restore orchestration
//!
//! `apply` walks every active category of a configuration in catalogue
//! order, backs up each target before its first modification, applies the
//! selected artifact and commits the successful records as one ledger
//! session. `restore` consumes the latest applied session.
//!
//! Per-file problems never abort an operation. They are collected as
//! [`FileFailure`] values in the returned report. Only a ledger that cannot
//! be read or written fails the call.

use std::fmt;

use fpm_fs::NormalizedPath;
use serde::Serialize;

use crate::applier::{ApplyError, PatchApplier};
use crate::artifact::ArtifactStore;
use crate::backup::BackupVault;
use crate::category::Category;
use crate::config::FingerprintConfig;
use crate::ledger::{ApplicationLedger, ApplicationRecord, ApplicationSession};
use crate::{Error, Result};

/// Lifecycle of the orchestrator within one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrchestratorState {
    Idle,
    Applying,
    Applied,
    Restoring,
    Restored,
}

/// Classification of a per-file failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Target file or backup missing
    NotFound,
    /// More than one artifact matched
    Ambiguous,
    /// The patch does not apply to the current content
    Conflict,
    /// Backup or artifact I/O failed
    IoFailure,
    /// The patch tool errored
    ToolFailure,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not found",
            Self::Ambiguous => "ambiguous",
            Self::Conflict => "conflict",
            Self::IoFailure => "I/O failure",
            Self::ToolFailure => "tool failure",
        };
        f.write_str(label)
    }
}

/// A target file that could not be applied or restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub category: Category,
    pub target: String,
    pub kind: FailureKind,
    pub message: String,
}

/// A target file with no artifact for the selected mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTarget {
    pub category: Category,
    pub mode: String,
    pub target: String,
}

/// Outcome of [`Orchestrator::apply`].
#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub session_id: String,
    /// Ledger file the session was committed to
    pub record_path: NormalizedPath,
    pub applied: Vec<ApplicationRecord>,
    pub skipped: Vec<SkippedTarget>,
    /// Categories present in the configuration but disabled or `default`
    pub inactive_categories: Vec<Category>,
    pub failures: Vec<FileFailure>,
}

impl ApplyReport {
    /// Active categories for which nothing was applied.
    pub fn skipped_categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = self
            .skipped
            .iter()
            .map(|s| s.category)
            .chain(self.failures.iter().map(|f| f.category))
            .filter(|c| !self.applied.iter().any(|r| r.category == *c))
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Outcome of [`Orchestrator::restore`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct RestoreReport {
    /// Consumed session, `None` when nothing was applied
    pub session_id: Option<String>,
    /// Ledger file the consumed session now lives in
    pub record_path: Option<NormalizedPath>,
    pub restored: Vec<String>,
    pub failures: Vec<FileFailure>,
}

impl RestoreReport {
    pub fn is_noop(&self) -> bool {
        self.session_id.is_none()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Coordinates the artifact store, backup vault, patch applier and ledger.
pub struct Orchestrator<A: PatchApplier> {
    src_root: NormalizedPath,
    store: ArtifactStore,
    vault: BackupVault,
    applier: A,
    ledger: ApplicationLedger,
    state: OrchestratorState,
}

impl<A: PatchApplier> Orchestrator<A> {
    pub fn new(
        src_root: NormalizedPath,
        store: ArtifactStore,
        vault: BackupVault,
        applier: A,
        ledger: ApplicationLedger,
    ) -> Self {
        Self {
            src_root,
            store,
            vault,
            applier,
            ledger,
            state: OrchestratorState::Idle,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn vault(&self) -> &BackupVault {
        &self.vault
    }

    pub fn ledger(&self) -> &ApplicationLedger {
        &self.ledger
    }

    /// Apply every artifact a configuration selects and commit a session.
    ///
    /// Refuses with [`Error::SessionOutstanding`] while an applied session
    /// exists. A session is committed even when nothing was applied.
    pub fn apply(&mut self, config: &FingerprintConfig) -> Result<ApplyReport> {
        if let Some(outstanding) = self.ledger.latest_applied()? {
            return Err(Error::SessionOutstanding { id: outstanding.id });
        }

        self.state = OrchestratorState::Applying;
        tracing::info!(config = %config.id, "Applying configuration");

        let mut applied = Vec::new();
        let mut skipped = Vec::new();
        let mut failures = Vec::new();

        for (category, setting) in config.active_settings() {
            tracing::debug!(%category, mode = %setting.mode, "Processing category");
            for target in self.store.targets(category) {
                match self.apply_target(category, &setting.mode, target) {
                    Ok(Some(record)) => applied.push(record),
                    Ok(None) => skipped.push(SkippedTarget {
                        category,
                        mode: setting.mode.clone(),
                        target: target.clone(),
                    }),
                    Err(failure) => failures.push(failure),
                }
            }
        }

        let session = ApplicationSession::new(config.id.clone(), applied);
        let record_path = match self.ledger.commit(&session) {
            Ok(path) => path,
            Err(e) => {
                self.state = OrchestratorState::Idle;
                return Err(e);
            }
        };
        self.state = OrchestratorState::Applied;

        tracing::info!(
            session = %session.id,
            applied = session.patches.len(),
            skipped = skipped.len(),
            failed = failures.len(),
            "Apply finished"
        );

        Ok(ApplyReport {
            session_id: session.id,
            record_path,
            applied: session.patches,
            skipped,
            inactive_categories: config.inactive_categories(),
            failures,
        })
    }

    /// One target file: `Ok(None)` when no artifact is selected.
    fn apply_target(
        &self,
        category: Category,
        mode: &str,
        target: &str,
    ) -> std::result::Result<Option<ApplicationRecord>, FileFailure> {
        let failure = |kind: FailureKind, message: String| FileFailure {
            category,
            target: target.to_string(),
            kind,
            message,
        };

        let artifact = match self.store.find(category, mode, target) {
            Ok(Some(artifact)) => artifact,
            Ok(None) => {
                tracing::warn!(%category, mode, target, "No patch found, skipping");
                return Ok(None);
            }
            Err(e @ Error::AmbiguousArtifact { .. }) => {
                tracing::error!(%category, target, error = %e, "Ambiguous patch selection");
                return Err(failure(FailureKind::Ambiguous, e.to_string()));
            }
            Err(e) => {
                tracing::warn!(%category, target, error = %e, "Could not read patch catalogue");
                return Err(failure(FailureKind::IoFailure, e.to_string()));
            }
        };

        let foreign = artifact.foreign_paths(target);
        if !foreign.is_empty() {
            tracing::error!(%category, target, patch = %artifact.file_name, others = ?foreign, "Patch modifies other files");
            return Err(failure(
                FailureKind::Ambiguous,
                format!(
                    "patch {} also modifies {}; each patch must change only its target",
                    artifact.file_name,
                    foreign.join(", ")
                ),
            ));
        }

        if !self.src_root.join(target).is_file() {
            tracing::warn!(%category, target, "Target file does not exist, skipping");
            return Err(failure(
                FailureKind::NotFound,
                format!("target file {target} does not exist"),
            ));
        }

        if let Err(e) = self.vault.ensure_backup(target) {
            tracing::warn!(%category, target, error = %e, "Backup failed, not patching");
            return Err(failure(FailureKind::IoFailure, e.to_string()));
        }

        match self.applier.apply(&artifact, target) {
            Ok(()) => {
                tracing::info!(%category, target, patch = %artifact.file_name, "Applied patch");
                Ok(Some(ApplicationRecord {
                    category,
                    target_file: target.to_string(),
                    patch_file: artifact.id().to_string(),
                }))
            }
            Err(e @ ApplyError::Conflict { .. }) => {
                tracing::error!(%category, target, error = %e, "Patch conflict");
                Err(failure(FailureKind::Conflict, e.to_string()))
            }
            Err(e @ ApplyError::ToolFailure { .. }) => {
                tracing::warn!(%category, target, error = %e, "Patch tool failed");
                Err(failure(FailureKind::ToolFailure, e.to_string()))
            }
        }
    }

    /// Restore every file of the latest applied session and consume it.
    ///
    /// With no applied session this is a successful no-op, so calling it
    /// twice is safe.
    pub fn restore(&mut self) -> Result<RestoreReport> {
        let Some(session) = self.ledger.latest_applied()? else {
            tracing::info!("No applied session, nothing to restore");
            return Ok(RestoreReport::default());
        };

        self.state = OrchestratorState::Restoring;
        tracing::info!(session = %session.id, "Restoring session");

        let mut restored = Vec::new();
        let mut failures = Vec::new();
        for record in session.distinct_targets() {
            let (category, target) = (record.category, record.target_file.as_str());
            match self.vault.restore(target) {
                Ok(true) => restored.push(target.to_string()),
                Ok(false) => failures.push(FileFailure {
                    category,
                    target: target.to_string(),
                    kind: FailureKind::NotFound,
                    message: format!("no backup for {target}"),
                }),
                Err(e) => {
                    tracing::warn!(target, error = %e, "Restore failed");
                    failures.push(FileFailure {
                        category,
                        target: target.to_string(),
                        kind: FailureKind::IoFailure,
                        message: e.to_string(),
                    });
                }
            }
        }

        let record_path = self.ledger.mark_restored(&session)?;
        self.state = OrchestratorState::Restored;

        tracing::info!(
            session = %session.id,
            restored = restored.len(),
            failed = failures.len(),
            "Restore finished"
        );

        Ok(RestoreReport {
            session_id: Some(session.id),
            record_path: Some(record_path),
            restored,
            failures,
        })
    }
}
