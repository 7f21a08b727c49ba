//! Backup vault
//!
//! Preserves the pristine content of every target file before its first
//! modification since the last restore, and puts it back on restore.
//!
//! Backups are stored under `backups/` mirroring the source tree, with an
//! index (`.vault.json`) recording capture time and checksum.

mod vault;

pub use vault::{BackupEntry, BackupVault};
