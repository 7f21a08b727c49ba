//! Patch artifact catalogue
//!
//! Artifacts live under `patches/<category>/` and are named
//! `<mode>_<name>_<basename>.patch`. The store never writes; it only answers
//! "which artifact, if any, does this configuration select for this file".

use std::fs;

use fpm_fs::{Error as FsError, NormalizedPath};

use crate::category::{Category, MappingTable};
use crate::{Error, Result};

/// Extension every artifact carries.
pub const ARTIFACT_EXTENSION: &str = "patch";

/// One patch file in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchArtifact {
    pub category: Category,
    /// File name inside the category directory
    pub file_name: String,
    /// Absolute location on disk; doubles as the artifact identifier
    pub path: NormalizedPath,
    /// Target path embedded in the diff header (`+++ b/<path>`), if readable
    pub target_hint: Option<String>,
    /// Every file the diff modifies, in header order, without duplicates
    pub touched_paths: Vec<String>,
}

impl PatchArtifact {
    /// Stable identifier recorded in the ledger.
    pub fn id(&self) -> &str {
        self.path.as_str()
    }

    /// Files other than `target` that applying this artifact would modify.
    pub fn foreign_paths(&self, target: &str) -> Vec<&str> {
        let target = NormalizedPath::new(target);
        self.touched_paths
            .iter()
            .map(String::as_str)
            .filter(|path| *path != target.as_str())
            .collect()
    }

    fn load(category: Category, file_name: String, path: NormalizedPath) -> Self {
        let (target_hint, touched_paths) = match fpm_fs::io::read_text(&path) {
            Ok(content) => (parse_target_hint(&content), parse_touched_paths(&content)),
            Err(e) => {
                tracing::debug!(artifact = %path, error = %e, "Could not read artifact header");
                (None, Vec::new())
            }
        };
        Self {
            category,
            file_name,
            path,
            target_hint,
            touched_paths,
        }
    }
}

/// Path of one `---`/`+++` header value, `None` for `/dev/null`.
fn header_path(value: &str, prefix: &str) -> Option<String> {
    let path = value.split('\t').next().unwrap_or(value).trim();
    if path == "/dev/null" || path.is_empty() {
        return None;
    }
    let path = path.strip_prefix(prefix).unwrap_or(path);
    Some(NormalizedPath::new(path).as_str().to_string())
}

/// Extract the post-image path from the first `+++` header line.
///
/// Strips the `b/` prefix and any trailing tab-separated timestamp. Returns
/// `None` for `/dev/null` (deletions) or when no header exists.
pub fn parse_target_hint(content: &str) -> Option<String> {
    let header = content.lines().find_map(|line| line.strip_prefix("+++ "))?;
    header_path(header, "b/")
}

/// Every file named by a `---`/`+++` header pair.
///
/// Only a `---` line directly followed by a `+++` line counts as a header,
/// so removed lines that happen to start with `--` are not mistaken for one.
/// Deletions contribute their pre-image path.
pub fn parse_touched_paths(content: &str) -> Vec<String> {
    let lines: Vec<&str> = content.lines().collect();
    let mut paths: Vec<String> = Vec::new();
    for pair in lines.windows(2) {
        let (Some(old), Some(new)) = (pair[0].strip_prefix("--- "), pair[1].strip_prefix("+++ ")) else {
            continue;
        };
        let path = header_path(new, "b/").or_else(|| header_path(old, "a/"));
        if let Some(path) = path
            && !paths.contains(&path)
        {
            paths.push(path);
        }
    }
    paths
}

/// Last path component of a relative target path.
fn basename(target_file: &str) -> &str {
    target_file.rsplit(['/', '\\']).next().unwrap_or(target_file)
}

/// Read-only view over the artifact catalogue and the mapping table.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    patches_dir: NormalizedPath,
    mapping: MappingTable,
}

impl ArtifactStore {
    pub fn new(patches_dir: NormalizedPath, mapping: MappingTable) -> Self {
        Self {
            patches_dir,
            mapping,
        }
    }

    pub fn mapping(&self) -> &MappingTable {
        &self.mapping
    }

    /// Target files for a category, in declaration order.
    pub fn targets(&self, category: Category) -> &[String] {
        self.mapping.targets(category)
    }

    /// Directory holding the artifacts of one category.
    pub fn category_dir(&self, category: Category) -> NormalizedPath {
        self.patches_dir.join(category.as_str())
    }

    /// Where an artifact with the given coordinates is stored.
    pub fn artifact_path(
        &self,
        category: Category,
        mode: &str,
        name: &str,
        target_file: &str,
    ) -> NormalizedPath {
        self.category_dir(category).join(&format!(
            "{mode}_{name}_{}.{ARTIFACT_EXTENSION}",
            basename(target_file)
        ))
    }

    /// All artifacts of a category, sorted by file name.
    ///
    /// A missing category directory is an empty catalogue, not an error.
    pub fn list(&self, category: Category) -> Result<Vec<PatchArtifact>> {
        let dir = self.category_dir(category);
        if !dir.is_dir() {
            tracing::debug!(dir = %dir, "Category directory missing");
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(dir.to_native()).map_err(|e| FsError::io(dir.to_native(), e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FsError::io(dir.to_native(), e))?;
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(&format!(".{ARTIFACT_EXTENSION}")) {
                names.push(name);
            }
        }
        names.sort();

        Ok(names
            .into_iter()
            .map(|name| {
                let path = dir.join(&name);
                PatchArtifact::load(category, name, path)
            })
            .collect())
    }

    /// Select the artifact for one (category, mode, target file).
    ///
    /// Candidates are artifacts whose file name starts with `<mode>_` and
    /// contains the target's base name. A candidate whose embedded header
    /// names a different file is dropped, since applying it would modify that
    /// other file. More than one remaining candidate is an
    /// [`Error::AmbiguousArtifact`].
    pub fn find(
        &self,
        category: Category,
        mode: &str,
        target_file: &str,
    ) -> Result<Option<PatchArtifact>> {
        let prefix = format!("{mode}_");
        let base = basename(target_file);
        let target = NormalizedPath::new(target_file);

        let mut candidates: Vec<PatchArtifact> = self
            .list(category)?
            .into_iter()
            .filter(|a| a.file_name.starts_with(&prefix) && a.file_name.contains(base))
            .filter(|a| match &a.target_hint {
                Some(hint) => hint == target.as_str(),
                None => true,
            })
            .collect();

        match candidates.len() {
            0 => Ok(None),
            1 => Ok(candidates.pop()),
            _ => Err(Error::AmbiguousArtifact {
                category: category.to_string(),
                mode: mode.to_string(),
                target: target_file.to_string(),
                candidates: candidates.into_iter().map(|a| a.file_name).collect(),
            }),
        }
    }
}
