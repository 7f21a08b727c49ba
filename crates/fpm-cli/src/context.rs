//! Workspace root resolution
//!
//! Commands operate on a base directory holding `src/`, `patches/`,
//! `configs/` and `backups/`. It comes from `--root` / `FPM_ROOT` or the
//! current directory.

use std::path::{Path, PathBuf};

use fpm_core::Workspace;
use fpm_fs::NormalizedPath;

use crate::error::Result;

/// Absolute workspace base directory.
pub fn resolve_root(root: Option<&Path>) -> Result<NormalizedPath> {
    let cwd = std::env::current_dir()?;
    let base = match root {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => cwd.join(path),
        None => cwd,
    };
    Ok(NormalizedPath::new(base))
}

/// Open the workspace at the resolved root.
pub fn open_workspace(root: &NormalizedPath) -> Result<Workspace> {
    Ok(Workspace::open(root.clone())?)
}

/// Resolve a user-supplied file path against the current directory.
pub fn user_path(path: &Path) -> Result<NormalizedPath> {
    if path.is_absolute() {
        return Ok(NormalizedPath::new(path));
    }
    let cwd: PathBuf = std::env::current_dir()?;
    Ok(NormalizedPath::new(cwd.join(path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_root_is_kept() {
        let temp = tempfile::tempdir().unwrap();
        let root = resolve_root(Some(temp.path())).unwrap();
        assert_eq!(root, NormalizedPath::new(temp.path()));
    }

    #[test]
    fn missing_root_uses_current_dir() {
        let root = resolve_root(None).unwrap();
        assert_eq!(root, NormalizedPath::new(std::env::current_dir().unwrap()));
    }
}
