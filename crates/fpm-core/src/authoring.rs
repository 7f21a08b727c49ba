//! Patch authoring
//!
//! Turns an (original, modified) pair of a target file into an artifact in
//! the catalogue. Diffs are rendered in-process as git-style unified diffs
//! with `a/<rel>` / `b/<rel>` headers, which is what `git apply` expects.

use fpm_fs::{NormalizedPath, io, validate_relative_path};
use similar::TextDiff;

use crate::artifact::ArtifactStore;
use crate::category::Category;
use crate::config::DEFAULT_MODE;
use crate::{Error, Result};

const CONTEXT_LINES: usize = 3;

/// Render a unified diff of one file, or `None` if nothing changed.
pub fn render_patch(rel: &str, original: &str, modified: &str) -> Option<String> {
    if original == modified {
        return None;
    }
    let rel = NormalizedPath::new(rel);
    let diff = TextDiff::from_lines(original, modified);
    let body = diff
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(&format!("a/{rel}"), &format!("b/{rel}"))
        .to_string();
    Some(format!("diff --git a/{rel} b/{rel}\n{body}"))
}

/// Coordinates of a new artifact.
#[derive(Debug, Clone)]
pub struct PatchRequest {
    pub category: Category,
    pub mode: String,
    pub name: String,
    /// Target path relative to the source root
    pub target_file: String,
}

/// Mode and name become part of the artifact file name.
fn validate_component(kind: &str, value: &str) -> Result<()> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidConfig {
            message: format!("{kind} '{value}' may only contain letters, digits, '-' and '_'"),
        })
    }
}

impl PatchRequest {
    fn validate(&self) -> Result<NormalizedPath> {
        validate_component("mode", &self.mode)?;
        validate_component("name", &self.name)?;
        if self.mode == DEFAULT_MODE {
            return Err(Error::InvalidConfig {
                message: format!("mode '{DEFAULT_MODE}' never selects patches"),
            });
        }
        Ok(validate_relative_path(&self.target_file)?)
    }
}

/// Writes new artifacts into the catalogue.
pub struct PatchAuthor<'a> {
    store: &'a ArtifactStore,
    src_root: &'a NormalizedPath,
}

impl<'a> PatchAuthor<'a> {
    pub fn new(store: &'a ArtifactStore, src_root: &'a NormalizedPath) -> Self {
        Self { store, src_root }
    }

    /// Current content of the request's target file.
    pub fn original(&self, request: &PatchRequest) -> Result<String> {
        let rel = request.validate()?;
        let path = self.src_root.join(rel.as_str());
        if !path.is_file() {
            return Err(Error::NotFound(format!("target file {path}")));
        }
        Ok(io::read_text(&path)?)
    }

    /// Diff `modified` against the target and store the artifact.
    ///
    /// Returns the artifact path. Identical content is [`Error::NoChanges`]
    /// and writes nothing.
    pub fn write(&self, request: &PatchRequest, modified: &str) -> Result<NormalizedPath> {
        let rel = request.validate()?;
        let original = self.original(request)?;
        let patch = render_patch(rel.as_str(), &original, modified).ok_or_else(|| Error::NoChanges {
            path: rel.as_str().to_string(),
        })?;

        if !self
            .store
            .targets(request.category)
            .iter()
            .any(|t| t == rel.as_str())
        {
            tracing::warn!(
                category = %request.category,
                target = %rel,
                "Target is not mapped to this category; the patch will not be selected by apply"
            );
        }

        let path = self.store.artifact_path(
            request.category,
            &request.mode,
            &request.name,
            rel.as_str(),
        );
        if path.exists() {
            tracing::warn!(artifact = %path, "Overwriting existing patch");
        }
        io::write_text(&path, &patch)?;
        tracing::info!(artifact = %path, "Wrote patch");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::parse_target_hint;
    use crate::category::MappingTable;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ArtifactStore, NormalizedPath) {
        let temp = TempDir::new().unwrap();
        let base = NormalizedPath::new(temp.path());
        let src = base.join("src");
        fs::create_dir_all(temp.path().join("src/base/time")).unwrap();
        fs::write(temp.path().join("src/base/time/time.cc"), "a\nb\nc\n").unwrap();
        let table = MappingTable::empty()
            .with_targets(Category::Timezone, ["base/time/time.cc"])
            .unwrap();
        (temp, ArtifactStore::new(base.join("patches"), table), src)
    }

    fn request(mode: &str) -> PatchRequest {
        PatchRequest {
            category: Category::Timezone,
            mode: mode.to_string(),
            name: "tokyo".to_string(),
            target_file: "base/time/time.cc".to_string(),
        }
    }

    #[test]
    fn render_patch_has_git_headers() {
        let patch = render_patch("base/time/time.cc", "a\nb\nc\n", "a\nB\nc\n").unwrap();
        assert!(patch.starts_with("diff --git a/base/time/time.cc b/base/time/time.cc\n"));
        assert!(patch.contains("--- a/base/time/time.cc\n+++ b/base/time/time.cc\n"));
        assert!(patch.contains("-b\n+B\n"));
        assert_eq!(parse_target_hint(&patch).as_deref(), Some("base/time/time.cc"));
    }

    #[test]
    fn render_patch_without_changes_is_none() {
        assert!(render_patch("x.cc", "same\n", "same\n").is_none());
    }

    #[test]
    fn write_stores_selectable_artifact() {
        let (_temp, store, src) = setup();
        let author = PatchAuthor::new(&store, &src);

        let path = author.write(&request("custom"), "a\nTOKYO\nc\n").unwrap();

        assert_eq!(path.file_name(), Some("custom_tokyo_time.cc.patch"));
        let found = store
            .find(Category::Timezone, "custom", "base/time/time.cc")
            .unwrap()
            .unwrap();
        assert_eq!(found.path, path);
    }

    #[test]
    fn unchanged_content_is_rejected() {
        let (_temp, store, src) = setup();
        let author = PatchAuthor::new(&store, &src);
        let err = author.write(&request("custom"), "a\nb\nc\n").unwrap_err();
        assert!(matches!(err, Error::NoChanges { .. }));
        assert!(store.list(Category::Timezone).unwrap().is_empty());
    }

    #[test]
    fn invalid_coordinates_are_rejected() {
        let (_temp, store, src) = setup();
        let author = PatchAuthor::new(&store, &src);
        for mode in ["default", "", "a/b"] {
            assert!(author.write(&request(mode), "x\n").is_err(), "mode {mode:?}");
        }
        let mut escaping = request("custom");
        escaping.target_file = "../etc/hosts".to_string();
        assert!(author.write(&escaping, "x\n").is_err());
    }
}
