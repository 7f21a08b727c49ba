//! Helpers for tests that drive the real `git apply`.

use std::process::{Command, Stdio};
use std::sync::OnceLock;

/// Whether a working `git` executable is on `PATH`.
///
/// Tests that need it return early when it is missing.
pub fn git_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| {
        Command::new("git")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    })
}

/// A single-hunk patch replacing all of `old` with `new` in `rel`.
///
/// Both contents must be newline-terminated.
pub fn whole_file_patch(rel: &str, old: &str, new: &str) -> String {
    assert!(
        old.ends_with('\n') && new.ends_with('\n'),
        "whole_file_patch: contents must end with a newline"
    );
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();

    let mut patch = format!(
        "diff --git a/{rel} b/{rel}\n--- a/{rel}\n+++ b/{rel}\n@@ -1,{} +1,{} @@\n",
        old_lines.len(),
        new_lines.len()
    );
    for line in old_lines {
        patch.push_str(&format!("-{line}\n"));
    }
    for line in new_lines {
        patch.push_str(&format!("+{line}\n"));
    }
    patch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_file_patch_counts_lines() {
        let patch = whole_file_patch("a/b.cc", "x\ny\n", "z\n");
        assert!(patch.contains("@@ -1,2 +1,1 @@\n-x\n-y\n+z\n"));
        assert!(patch.contains("+++ b/a/b.cc\n"));
    }
}
