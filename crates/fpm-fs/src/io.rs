//! Atomic I/O operations with file locking

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Write content atomically to a file with locking.
///
/// Writes to a temp file beside the target, then renames it over the target.
/// Parent directories are created. The temp file is removed if any step
/// fails.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Same directory as the target keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    let result = write_locked(temp_file, content, &temp_path, &native_path)
        .and_then(|()| fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e)));

    if result.is_err()
        && let Err(e) = fs::remove_file(&temp_path)
    {
        tracing::warn!(path = %temp_path.display(), error = %e, "Failed to remove temp file");
    }
    result
}

fn write_locked(mut file: File, content: &[u8], temp_path: &Path, target: &Path) -> Result<()> {
    let lock_failed = || Error::LockFailed {
        path: target.to_path_buf(),
    };
    file.lock_exclusive().map_err(|_| lock_failed())?;
    file.write_all(content).map_err(|e| Error::io(temp_path, e))?;
    file.sync_all().map_err(|e| Error::io(temp_path, e))?;
    file.unlock().map_err(|_| lock_failed())?;
    Ok(())
}

/// Read raw bytes from a file.
pub fn read_bytes(path: &NormalizedPath) -> Result<Vec<u8>> {
    let native_path = path.to_native();
    fs::read(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Write text content to a file atomically.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Exclusive advisory lock held for the lifetime of the guard.
///
/// Used to serialize ledger scans and renames between processes. The lock
/// file itself carries no content.
#[derive(Debug)]
pub struct LockGuard {
    file: File,
    path: NormalizedPath,
}

impl LockGuard {
    /// Block until the exclusive lock on `path` is acquired.
    pub fn acquire(path: &NormalizedPath) -> Result<Self> {
        let native_path = path.to_native();
        if let Some(parent) = native_path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&native_path)
            .map_err(|e| Error::io(&native_path, e))?;

        file.lock_exclusive().map_err(|_| Error::LockFailed {
            path: native_path.clone(),
        })?;
        tracing::trace!(path = %path, "Acquired lock");

        Ok(Self {
            file,
            path: path.clone(),
        })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!(path = %self.path, error = %e, "Failed to release lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_guard_is_reacquirable_after_drop() {
        let temp = TempDir::new().unwrap();
        let path = NormalizedPath::new(temp.path().join("locks/.ledger.lock"));

        let guard = LockGuard::acquire(&path).unwrap();
        drop(guard);
        let _again = LockGuard::acquire(&path).unwrap();
        assert!(path.exists());
    }
}
