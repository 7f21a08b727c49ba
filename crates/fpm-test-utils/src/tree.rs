//! [`TestTree`] builder for patch manager test scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::git::whole_file_patch;

/// A temporary workspace base directory with `src/`, `patches/`, `configs/`
/// and `backups/`, plus helpers to populate and inspect it.
///
/// # Example
///
/// ```rust,no_run
/// use fpm_test_utils::TestTree;
///
/// let tree = TestTree::new();
/// tree.source("base/time/time.cc", "int tz = 0;\n");
/// tree.replacement_patch("timezone", "custom_tokyo_time.cc.patch", "base/time/time.cc", "int tz = 9;\n");
/// tree.assert_source("base/time/time.cc", "int tz = 0;\n");
/// ```
pub struct TestTree {
    temp_dir: TempDir,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    /// Create a base directory with the four layout directories.
    pub fn new() -> Self {
        let tree = Self {
            temp_dir: TempDir::new().unwrap(),
        };
        for dir in ["src", "patches", "configs", "backups"] {
            fs::create_dir_all(tree.root().join(dir)).unwrap();
        }
        tree
    }

    /// Workspace base directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn src(&self) -> PathBuf {
        self.root().join("src")
    }

    pub fn configs(&self) -> PathBuf {
        self.root().join("configs")
    }

    /// Write a source file relative to `src/`.
    pub fn source(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.src().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// Read a source file relative to `src/`.
    pub fn read_source(&self, rel: &str) -> String {
        let path = self.src().join(rel);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read source file: {}", path.display()))
    }

    /// Write a raw patch artifact into `patches/<category>/<name>`.
    pub fn patch(&self, category: &str, name: &str, content: &str) -> PathBuf {
        let dir = self.root().join("patches").join(category);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Write an artifact that replaces the current content of `rel` with
    /// `new`. The source file must already exist.
    pub fn replacement_patch(&self, category: &str, name: &str, rel: &str, new: &str) -> PathBuf {
        let old = self.read_source(rel);
        self.patch(category, name, &whole_file_patch(rel, &old, new))
    }

    /// Write `fpm.toml` with a `[mappings]` table for the given categories.
    pub fn mappings(&self, mappings: &[(&str, &[&str])]) {
        let mut content = String::from("[mappings]\n");
        for (category, files) in mappings {
            let files = files
                .iter()
                .map(|f| format!("\"{f}\""))
                .collect::<Vec<_>>()
                .join(", ");
            content.push_str(&format!("{category} = [{files}]\n"));
        }
        fs::write(self.root().join("fpm.toml"), content).unwrap();
    }

    /// Write a fingerprint configuration with the given (category, mode)
    /// settings. Returns its path.
    pub fn config(&self, id: &str, settings: &[(&str, &str)]) -> PathBuf {
        let settings = settings
            .iter()
            .map(|(category, mode)| {
                format!("\"{category}\": {{\"enabled\": true, \"mode\": \"{mode}\", \"params\": {{}}}}")
            })
            .collect::<Vec<_>>()
            .join(", ");
        let content = format!(
            "{{\"id\": \"{id}\", \"created_at\": \"2025-01-01T00:00:00Z\", \"settings\": {{{settings}}}}}"
        );
        let path = self.root().join(format!("{id}.json"));
        fs::write(&path, content).unwrap();
        path
    }

    /// File names in `configs/`, sorted.
    pub fn config_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.configs())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();
        names
    }

    /// Assert that a source file has exactly `content`.
    ///
    /// # Panics
    /// Panics with both contents if they differ.
    pub fn assert_source(&self, rel: &str, content: &str) {
        let actual = self.read_source(rel);
        assert_eq!(
            actual, content,
            "Source file {rel} differs.\nExpected: {content}\nActual: {actual}"
        );
    }

    /// Assert that `path` (relative to the base) exists.
    pub fn assert_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(full_path.exists(), "Expected path to exist: {}", full_path.display());
    }

    /// Assert that `path` (relative to the base) does **not** exist.
    pub fn assert_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected path NOT to exist: {}",
            full_path.display()
        );
    }
}
