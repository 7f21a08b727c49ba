//! Filesystem layer for the fingerprint patch manager
//!
//! Provides normalized path handling, the on-disk workspace layout, and
//! atomic, lock-guarded I/O used by the ledger and the backup vault.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod layout;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use layout::{Layout, LayoutDir};
pub use path::{NormalizedPath, validate_relative_path};
