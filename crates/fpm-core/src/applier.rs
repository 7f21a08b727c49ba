//! Patch application
//!
//! The orchestrator only needs "apply this artifact to this target, or tell
//! me why not". [`GitApplier`] shells out to `git apply`; tests substitute
//! their own [`PatchApplier`].

use std::process::Command;

use fpm_fs::NormalizedPath;

use crate::artifact::PatchArtifact;

/// Why a single artifact could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    /// The patch context does not match the target content
    #[error("Patch {artifact} does not apply to {target}: {detail}")]
    Conflict {
        artifact: String,
        target: String,
        detail: String,
    },

    /// The patch tool could not be run or failed for another reason
    #[error("Patch tool failed for {artifact} (exit code {}): {detail}", code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    ToolFailure {
        artifact: String,
        code: Option<i32>,
        detail: String,
    },
}

/// Applies one patch artifact to one target file inside the source root.
pub trait PatchApplier {
    /// Apply `artifact` to `target` (relative to the source root).
    ///
    /// On error the target must be left unmodified.
    fn apply(&self, artifact: &PatchArtifact, target: &str) -> Result<(), ApplyError>;
}

/// Stderr fragments `git apply` emits when the context does not match.
const CONFLICT_MARKERS: &[&str] = &[
    "patch does not apply",
    "while searching for",
    "patch failed",
    "does not exist in index",
];

/// Runs `git apply --ignore-whitespace` from the source root.
///
/// `git apply` checks every hunk before touching the working tree, so a
/// rejected patch leaves the target as it was.
#[derive(Debug, Clone)]
pub struct GitApplier {
    git: String,
    src_root: NormalizedPath,
    extra_args: Vec<String>,
}

impl GitApplier {
    pub fn new(src_root: NormalizedPath) -> Self {
        Self {
            git: "git".to_string(),
            src_root,
            extra_args: Vec::new(),
        }
    }

    /// Use a different git executable.
    pub fn with_git(mut self, git: impl Into<String>) -> Self {
        self.git = git.into();
        self
    }

    /// Extra arguments passed to `git apply` before the patch path.
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    fn command(&self, artifact: &PatchArtifact) -> Command {
        let mut cmd = Command::new(&self.git);
        cmd.arg("apply")
            .arg("--ignore-whitespace")
            .args(&self.extra_args)
            .arg(artifact.path.to_native())
            .current_dir(self.src_root.to_native());
        // Keep git from discovering a repository above the source root
        if let Some(parent) = self.src_root.parent() {
            cmd.env("GIT_CEILING_DIRECTORIES", parent.to_native());
        }
        cmd
    }
}

impl PatchApplier for GitApplier {
    fn apply(&self, artifact: &PatchArtifact, target: &str) -> Result<(), ApplyError> {
        tracing::debug!(artifact = %artifact.path, target, "Running git apply");

        let output = self
            .command(artifact)
            .output()
            .map_err(|e| ApplyError::ToolFailure {
                artifact: artifact.id().to_string(),
                code: None,
                detail: format!("failed to run {}: {e}", self.git),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(classify_failure(artifact, target, output.status.code(), stderr))
    }
}

fn classify_failure(
    artifact: &PatchArtifact,
    target: &str,
    code: Option<i32>,
    stderr: String,
) -> ApplyError {
    if CONFLICT_MARKERS.iter().any(|marker| stderr.contains(marker)) {
        ApplyError::Conflict {
            artifact: artifact.id().to_string(),
            target: target.to_string(),
            detail: stderr,
        }
    } else {
        ApplyError::ToolFailure {
            artifact: artifact.id().to_string(),
            code,
            detail: stderr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;

    fn artifact() -> PatchArtifact {
        PatchArtifact {
            category: Category::Timezone,
            file_name: "custom_x_time.cc.patch".to_string(),
            path: NormalizedPath::new("/tmp/patches/timezone/custom_x_time.cc.patch"),
            target_hint: Some("base/time/time.cc".to_string()),
            touched_paths: vec!["base/time/time.cc".to_string()],
        }
    }

    #[test]
    fn context_mismatch_is_a_conflict() {
        let err = classify_failure(
            &artifact(),
            "base/time/time.cc",
            Some(1),
            "error: patch failed: base/time/time.cc:1\nerror: base/time/time.cc: patch does not apply".to_string(),
        );
        assert!(matches!(err, ApplyError::Conflict { ref target, .. } if target == "base/time/time.cc"));
    }

    #[test]
    fn other_failures_are_tool_failures() {
        let err = classify_failure(
            &artifact(),
            "base/time/time.cc",
            Some(128),
            "error: unrecognized input".to_string(),
        );
        assert!(matches!(err, ApplyError::ToolFailure { code: Some(128), .. }));
    }

    #[test]
    fn missing_executable_is_a_tool_failure() {
        let applier = GitApplier::new(NormalizedPath::new(std::env::temp_dir()))
            .with_git("fpm-definitely-not-a-real-git");
        let err = applier.apply(&artifact(), "base/time/time.cc").unwrap_err();
        assert!(matches!(err, ApplyError::ToolFailure { code: None, .. }));
        assert!(err.to_string().contains("exit code none"));
    }
}
