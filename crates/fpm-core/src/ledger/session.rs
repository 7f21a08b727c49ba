//! Application sessions and their records

use std::fmt;

use chrono::{DateTime, Utc};
use fpm_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// One artifact successfully applied to one target file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub category: Category,
    /// Target path relative to the source root
    pub target_file: String,
    /// Artifact identifier (its path)
    pub patch_file: String,
}

/// Lifecycle state, encoded in the session file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Applied,
    Restored,
}

impl SessionState {
    /// File name prefix for sessions in this state.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Applied => "applied_",
            Self::Restored => "restored_",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => write!(f, "applied"),
            Self::Restored => write!(f, "restored"),
        }
    }
}

/// The records produced by one `apply` call.
///
/// Serialized as `{fingerprint_id, applied_time, patches}`. State and file
/// location come from the file name, not the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSession {
    #[serde(rename = "fingerprint_id")]
    pub id: String,
    #[serde(with = "crate::timestamp")]
    pub applied_time: DateTime<Utc>,
    pub patches: Vec<ApplicationRecord>,
    #[serde(skip)]
    pub state: SessionState,
    /// Where the session is persisted, once committed or loaded
    #[serde(skip)]
    pub file: Option<NormalizedPath>,
}

impl ApplicationSession {
    /// A fresh, uncommitted session.
    pub fn new(id: impl Into<String>, patches: Vec<ApplicationRecord>) -> Self {
        Self {
            id: id.into(),
            applied_time: Utc::now(),
            patches,
            state: SessionState::Applied,
            file: None,
        }
    }

    /// The first record of every distinct target file, in record order.
    ///
    /// Several categories can map the same file; it is restored once.
    pub fn distinct_targets(&self) -> Vec<&ApplicationRecord> {
        let mut seen = std::collections::HashSet::new();
        self.patches
            .iter()
            .filter(|record| seen.insert(record.target_file.as_str()))
            .collect()
    }

    pub fn is_applied(&self) -> bool {
        self.state == SessionState::Applied
    }
}
