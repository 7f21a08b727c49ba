//! SHA-256 checksum utilities
//!
//! A single canonical checksum format (`sha256:<hex>`) is recorded for every
//! backup so a restore can tell whether the saved bytes were tampered with.

use sha2::{Digest, Sha256};

use crate::{Error, NormalizedPath, Result};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of raw bytes.
///
/// Returns a string in the canonical format `"sha256:<hex>"`.
pub fn compute_bytes_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute the SHA-256 checksum of a file's contents.
pub fn compute_file_checksum(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    let content = std::fs::read(&native_path).map_err(|e| Error::io(&native_path, e))?;
    Ok(compute_bytes_checksum(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_checksum_known_value() {
        let checksum = compute_bytes_checksum(b"hello world");
        assert_eq!(
            checksum,
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn different_content_different_checksum() {
        assert_ne!(compute_bytes_checksum(b"aaa"), compute_bytes_checksum(b"bbb"));
    }

    #[test]
    fn file_checksum_matches_bytes_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("time.cc");
        std::fs::write(&path, "int main() {}\n").unwrap();

        let file_cs = compute_file_checksum(&NormalizedPath::new(&path)).unwrap();
        assert_eq!(file_cs, compute_bytes_checksum(b"int main() {}\n"));
    }
}
