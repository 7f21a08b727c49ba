//! Backup vault implementation
//!
//! Backups mirror the source tree: the pristine copy of `src/<rel>` lives at
//! `backups/<rel>`. The presence of that file is what makes an entry live.
//! The index (`backups/.vault.json`) carries the capture time and checksum of
//! each live entry.

use std::collections::BTreeMap;
use std::fs;

use chrono::{DateTime, Utc};
use fpm_fs::checksum::{compute_bytes_checksum, compute_file_checksum};
use fpm_fs::io::{self, LockGuard};
use fpm_fs::{NormalizedPath, validate_relative_path};
use serde::{Deserialize, Serialize};

use crate::Result;

const INDEX_FILE: &str = ".vault.json";
const LOCK_FILE: &str = ".vault.lock";

/// A live backup of one target file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    /// Target path relative to the source root
    pub path: String,
    /// When the pristine content was captured
    #[serde(with = "crate::timestamp")]
    pub captured_at: DateTime<Utc>,
    /// `sha256:<hex>` of the saved content
    pub checksum: String,
    /// Size of the saved content in bytes
    pub size: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct VaultIndex {
    version: String,
    entries: BTreeMap<String, BackupEntry>,
}

impl VaultIndex {
    fn new() -> Self {
        Self {
            version: "1.0".to_string(),
            entries: BTreeMap::new(),
        }
    }
}

/// Content-preserving store keyed by target path. First write wins.
#[derive(Debug, Clone)]
pub struct BackupVault {
    src_root: NormalizedPath,
    backups_dir: NormalizedPath,
}

impl BackupVault {
    pub fn new(src_root: NormalizedPath, backups_dir: NormalizedPath) -> Self {
        Self {
            src_root,
            backups_dir,
        }
    }

    pub fn backups_dir(&self) -> &NormalizedPath {
        &self.backups_dir
    }

    fn backup_path(&self, rel: &NormalizedPath) -> NormalizedPath {
        self.backups_dir.join(rel.as_str())
    }

    fn index_path(&self) -> NormalizedPath {
        self.backups_dir.join(INDEX_FILE)
    }

    fn lock(&self) -> Result<LockGuard> {
        Ok(LockGuard::acquire(&self.backups_dir.join(LOCK_FILE))?)
    }

    fn load_index(&self) -> Result<VaultIndex> {
        let path = self.index_path();
        if !path.is_file() {
            return Ok(VaultIndex::new());
        }
        let content = io::read_text(&path)?;
        match serde_json::from_str(&content) {
            Ok(index) => Ok(index),
            Err(e) => {
                // Entries are re-derived from the backup files themselves
                tracing::warn!(index = %path, error = %e, "Vault index unreadable, rebuilding");
                Ok(VaultIndex::new())
            }
        }
    }

    fn save_index(&self, index: &VaultIndex) -> Result<()> {
        let content = serde_json::to_string_pretty(index)?;
        io::write_text(&self.index_path(), &content)?;
        Ok(())
    }

    /// Whether a live backup exists for `rel`.
    pub fn has_backup(&self, rel: &str) -> bool {
        validate_relative_path(rel)
            .map(|rel| self.backup_path(&rel).is_file())
            .unwrap_or(false)
    }

    /// The live entry for `rel`, if any.
    pub fn entry(&self, rel: &str) -> Result<Option<BackupEntry>> {
        let rel = validate_relative_path(rel)?;
        let backup = self.backup_path(&rel);
        if !backup.is_file() {
            return Ok(None);
        }
        let index = self.load_index()?;
        match index.entries.get(rel.as_str()) {
            Some(entry) => Ok(Some(entry.clone())),
            None => Ok(Some(entry_from_file(&rel, &backup)?)),
        }
    }

    /// Saved pristine bytes for `rel`.
    pub fn saved_content(&self, rel: &str) -> Result<Option<Vec<u8>>> {
        let rel = validate_relative_path(rel)?;
        let backup = self.backup_path(&rel);
        if !backup.is_file() {
            return Ok(None);
        }
        Ok(Some(io::read_bytes(&backup)?))
    }

    /// Snapshot `src/<rel>` unless a live entry already exists.
    ///
    /// Idempotent: an existing entry is returned unchanged and the current
    /// (possibly already patched) file is never re-captured.
    pub fn ensure_backup(&self, rel: &str) -> Result<BackupEntry> {
        let rel = validate_relative_path(rel)?;
        let _lock = self.lock()?;
        let backup = self.backup_path(&rel);
        let mut index = self.load_index()?;

        if backup.is_file() {
            if let Some(entry) = index.entries.get(rel.as_str()) {
                tracing::debug!(file = %rel, "Backup already present");
                return Ok(entry.clone());
            }
            // Backup file without index entry, e.g. written before a crash
            let entry = entry_from_file(&rel, &backup)?;
            index.entries.insert(rel.as_str().to_string(), entry.clone());
            self.save_index(&index)?;
            tracing::debug!(file = %rel, "Indexed existing backup");
            return Ok(entry);
        }

        let source = self.src_root.join(rel.as_str());
        let content = io::read_bytes(&source)?;
        io::write_atomic(&backup, &content)?;
        copy_permissions(&source, &backup);

        let entry = BackupEntry {
            path: rel.as_str().to_string(),
            captured_at: Utc::now(),
            checksum: compute_bytes_checksum(&content),
            size: content.len() as u64,
        };
        index.entries.insert(rel.as_str().to_string(), entry.clone());
        self.save_index(&index)?;

        tracing::info!(file = %rel, "Backed up file");
        Ok(entry)
    }

    /// Copy the saved content back over `src/<rel>` and destroy the entry.
    ///
    /// Returns `false` (with a warning) when no live entry exists.
    pub fn restore(&self, rel: &str) -> Result<bool> {
        let rel = validate_relative_path(rel)?;
        let _lock = self.lock()?;
        let backup = self.backup_path(&rel);
        let mut index = self.load_index()?;

        if !backup.is_file() {
            tracing::warn!(file = %rel, "No backup found, cannot restore");
            if index.entries.remove(rel.as_str()).is_some() {
                self.save_index(&index)?;
            }
            return Ok(false);
        }

        let content = io::read_bytes(&backup)?;
        if let Some(entry) = index.entries.get(rel.as_str()) {
            let actual = compute_bytes_checksum(&content);
            if actual != entry.checksum {
                tracing::warn!(
                    file = %rel,
                    expected = %entry.checksum,
                    actual = %actual,
                    "Backup checksum mismatch, restoring saved bytes anyway"
                );
            }
        }

        let target = self.src_root.join(rel.as_str());
        io::write_atomic(&target, &content)?;
        copy_permissions(&backup, &target);

        fs::remove_file(backup.to_native())
            .map_err(|e| fpm_fs::Error::io(backup.to_native(), e))?;
        prune_empty_parents(&backup, &self.backups_dir);
        index.entries.remove(rel.as_str());
        self.save_index(&index)?;

        tracing::info!(file = %rel, "Restored file");
        Ok(true)
    }

    /// All live entries, sorted by path.
    pub fn list(&self) -> Result<Vec<BackupEntry>> {
        let index = self.load_index()?;
        let mut live = Vec::new();
        for (rel, entry) in index.entries {
            let rel = NormalizedPath::new(&rel);
            if self.backup_path(&rel).is_file() {
                live.push(entry);
            }
        }
        Ok(live)
    }
}

fn entry_from_file(rel: &NormalizedPath, backup: &NormalizedPath) -> Result<BackupEntry> {
    let native = backup.to_native();
    let metadata = fs::metadata(&native).map_err(|e| fpm_fs::Error::io(&native, e))?;
    let captured_at = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());
    Ok(BackupEntry {
        path: rel.as_str().to_string(),
        captured_at,
        checksum: compute_file_checksum(backup)?,
        size: metadata.len(),
    })
}

fn copy_permissions(from: &NormalizedPath, to: &NormalizedPath) {
    let result = fs::metadata(from.to_native())
        .and_then(|m| fs::set_permissions(to.to_native(), m.permissions()));
    if let Err(e) = result {
        tracing::debug!(from = %from, to = %to, error = %e, "Could not copy permissions");
    }
}

/// Remove now-empty directories between `file` and `root`.
fn prune_empty_parents(file: &NormalizedPath, root: &NormalizedPath) {
    let mut current = file.parent();
    while let Some(dir) = current {
        if dir.relative_to(root).is_none() {
            break;
        }
        // remove_dir fails on non-empty directories, which ends the walk
        if fs::remove_dir(dir.to_native()).is_err() {
            break;
        }
        current = dir.parent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, BackupVault) {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("base/time")).unwrap();
        fs::write(src.join("base/time/time.cc"), "pristine\n").unwrap();
        let vault = BackupVault::new(
            NormalizedPath::new(&src),
            NormalizedPath::new(temp.path().join("backups")),
        );
        (temp, vault)
    }

    #[test]
    fn ensure_backup_captures_pristine_content() {
        let (temp, vault) = setup();
        assert!(!vault.has_backup("base/time/time.cc"));

        let entry = vault.ensure_backup("base/time/time.cc").unwrap();

        assert_eq!(entry.path, "base/time/time.cc");
        assert_eq!(entry.size, 9);
        assert_eq!(entry.checksum, compute_bytes_checksum(b"pristine\n"));
        assert!(vault.has_backup("base/time/time.cc"));
        assert_eq!(
            fs::read_to_string(temp.path().join("backups/base/time/time.cc")).unwrap(),
            "pristine\n"
        );
    }

    #[test]
    fn ensure_backup_never_resnapshots() {
        let (temp, vault) = setup();
        let first = vault.ensure_backup("base/time/time.cc").unwrap();

        fs::write(temp.path().join("src/base/time/time.cc"), "patched\n").unwrap();
        let second = vault.ensure_backup("base/time/time.cc").unwrap();

        assert_eq!(first, second);
        assert_eq!(
            vault.saved_content("base/time/time.cc").unwrap().unwrap(),
            b"pristine\n".to_vec()
        );
    }

    #[test]
    fn restore_copies_back_and_destroys_entry() {
        let (temp, vault) = setup();
        vault.ensure_backup("base/time/time.cc").unwrap();
        fs::write(temp.path().join("src/base/time/time.cc"), "patched\n").unwrap();

        assert!(vault.restore("base/time/time.cc").unwrap());

        assert_eq!(
            fs::read_to_string(temp.path().join("src/base/time/time.cc")).unwrap(),
            "pristine\n"
        );
        assert!(!vault.has_backup("base/time/time.cc"));
        assert!(vault.list().unwrap().is_empty());
        assert!(!temp.path().join("backups/base").exists(), "empty dirs are pruned");
    }

    #[test]
    fn restore_without_backup_is_non_fatal() {
        let (_temp, vault) = setup();
        assert!(!vault.restore("base/time/time.cc").unwrap());
    }

    #[test]
    fn unindexed_backup_file_is_adopted() {
        let (temp, vault) = setup();
        let orphan = temp.path().join("backups/base/time/time.cc");
        fs::create_dir_all(orphan.parent().unwrap()).unwrap();
        fs::write(&orphan, "older pristine\n").unwrap();

        let entry = vault.ensure_backup("base/time/time.cc").unwrap();

        assert_eq!(entry.checksum, compute_bytes_checksum(b"older pristine\n"));
        assert_eq!(vault.list().unwrap(), vec![entry]);
    }

    #[test]
    fn missing_source_file_is_an_error() {
        let (_temp, vault) = setup();
        assert!(vault.ensure_backup("base/time/missing.cc").is_err());
        assert!(!vault.has_backup("base/time/missing.cc"));
    }

    #[test]
    fn escaping_paths_are_rejected() {
        let (_temp, vault) = setup();
        assert!(vault.ensure_backup("../outside.cc").is_err());
        assert!(vault.restore("/etc/passwd").is_err());
    }
}
