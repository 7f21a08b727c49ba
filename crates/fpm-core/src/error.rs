//! Error types for fpm-core

use std::path::PathBuf;

/// Result type for fpm-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fpm-core operations
///
/// Failures that only concern a single target file during `apply` or
/// `restore` are not surfaced through this type; they are collected as
/// [`crate::orchestrator::FileFailure`] values in the operation report.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration document not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration document is structurally corrupt
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Category name not present in the catalogue
    #[error("Unknown category: {name}")]
    UnknownCategory { name: String },

    /// More than one artifact matches a (category, mode, target) triple
    #[error("Ambiguous artifacts for {category}/{mode} targeting {target}: {}", candidates.join(", "))]
    AmbiguousArtifact {
        category: String,
        mode: String,
        target: String,
        candidates: Vec<String>,
    },

    /// An un-restored session blocks a new application
    #[error("Session {id} is still applied; run restore first")]
    SessionOutstanding { id: String },

    /// Error in ledger operations
    #[error("Ledger error: {message}")]
    LedgerError { message: String },

    /// Patch authoring produced no change
    #[error("No changes between original and modified {path}")]
    NoChanges { path: String },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Filesystem error from fpm-fs
    #[error(transparent)]
    Fs(#[from] fpm_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}
