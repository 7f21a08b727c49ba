//! Normalized path handling for cross-platform compatibility

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A path normalized to use forward slashes internally.
///
/// Relative target paths double as keys in the backup vault and the ledger,
/// so they must compare equal across platforms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: path_str.replace('\\', "/"),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a (possibly multi-segment) relative path.
    pub fn join(&self, segment: &str) -> Self {
        let segment_normalized = segment.replace('\\', "/");
        let segment_normalized = segment_normalized.trim_start_matches('/');
        let joined = if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment_normalized)
        } else {
            format!("{}/{}", self.inner, segment_normalized)
        };
        Self { inner: joined }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) if idx > 0 => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }

    /// Express this path relative to `base`.
    ///
    /// Returns `None` when the path does not live under `base`.
    pub fn relative_to(&self, base: &NormalizedPath) -> Option<NormalizedPath> {
        let base = base.inner.trim_end_matches('/');
        let rest = self.inner.strip_prefix(base)?;
        let rest = rest.strip_prefix('/')?;
        if rest.is_empty() {
            return None;
        }
        Some(Self {
            inner: rest.to_string(),
        })
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }
}

/// Validate a path that must stay inside the root it is joined onto.
///
/// Rejects empty paths, absolute paths, drive prefixes and any `..`
/// component.
pub fn validate_relative_path(path: &str) -> Result<NormalizedPath> {
    let normalized = NormalizedPath::new(path);
    let unsafe_path = |reason: &str| Error::UnsafePath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let s = normalized.as_str();
    if s.trim().is_empty() {
        return Err(unsafe_path("path is empty"));
    }
    if s.starts_with('/') {
        return Err(unsafe_path("path is absolute"));
    }
    if s.len() >= 2 && s.as_bytes()[1] == b':' {
        return Err(unsafe_path("path has a drive prefix"));
    }
    if s.split('/').any(|component| component == "..") {
        return Err(unsafe_path("path escapes its root"));
    }

    Ok(normalized)
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<NormalizedPath> for String {
    fn from(path: NormalizedPath) -> Self {
        path.inner
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn join_handles_nested_segments() {
        let base = NormalizedPath::new("/work/src");
        let joined = base.join("ui/display/screen.cc");
        assert_eq!(joined.as_str(), "/work/src/ui/display/screen.cc");
        assert_eq!(joined.file_name(), Some("screen.cc"));
        assert_eq!(joined.extension(), Some("cc"));
    }

    #[test]
    fn relative_to_strips_base() {
        let base = NormalizedPath::new("/work/src/");
        let file = NormalizedPath::new("/work/src/base/time/time.cc");
        assert_eq!(
            file.relative_to(&base).map(|p| p.as_str().to_string()),
            Some("base/time/time.cc".to_string())
        );
        assert!(NormalizedPath::new("/elsewhere/x.cc").relative_to(&base).is_none());
        assert!(NormalizedPath::new("/work/srcx/y.cc").relative_to(&base).is_none());
    }

    #[rstest]
    #[case("base/time/time.cc", true)]
    #[case("ui\\display\\screen.cc", true)]
    #[case("", false)]
    #[case("/etc/passwd", false)]
    #[case("C:/Windows/win.ini", false)]
    #[case("../outside.cc", false)]
    #[case("net/../../outside.cc", false)]
    fn validate_relative_path_cases(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(validate_relative_path(input).is_ok(), ok, "input: {input:?}");
    }
}
