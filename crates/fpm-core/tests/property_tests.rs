//! Property tests for backup idempotence and artifact selection.

use std::fs;

use fpm_core::{ArtifactStore, BackupVault, Category, MappingTable};
use fpm_fs::NormalizedPath;
use proptest::prelude::*;
use tempfile::TempDir;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// However often the file is mutated and re-backed-up, restore yields
    /// the content present at the first backup.
    #[test]
    fn first_backup_wins(
        original in proptest::collection::vec(any::<u8>(), 0..256),
        mutations in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 1..4),
    ) {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("ui")).unwrap();
        fs::write(src.join("ui/screen.cc"), &original).unwrap();
        let vault = BackupVault::new(NormalizedPath::new(&src), NormalizedPath::new(temp.path().join("backups")));

        let first = vault.ensure_backup("ui/screen.cc").unwrap();
        for content in &mutations {
            fs::write(src.join("ui/screen.cc"), content).unwrap();
            prop_assert_eq!(&vault.ensure_backup("ui/screen.cc").unwrap(), &first);
        }

        prop_assert!(vault.restore("ui/screen.cc").unwrap());
        prop_assert_eq!(fs::read(src.join("ui/screen.cc")).unwrap(), original);
        prop_assert!(!vault.has_backup("ui/screen.cc"));
    }

    /// Selection depends only on the catalogue contents, and a selected
    /// artifact always carries the requested mode prefix.
    #[test]
    fn selection_is_deterministic(
        names in proptest::collection::btree_set("(custom|noise|custom2)_[a-z]{1,4}_time\\.cc\\.patch", 0..5),
    ) {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("patches/timezone");
        fs::create_dir_all(&dir).unwrap();
        for name in &names {
            fs::write(dir.join(name), "+++ b/base/time/time.cc\n").unwrap();
        }
        let table = MappingTable::empty().with_targets(Category::Timezone, ["base/time/time.cc"]).unwrap();
        let store = ArtifactStore::new(NormalizedPath::new(temp.path().join("patches")), table);

        let first = store.find(Category::Timezone, "custom", "base/time/time.cc");
        let second = store.find(Category::Timezone, "custom", "base/time/time.cc");

        let matching = names.iter().filter(|n| n.starts_with("custom_")).count();
        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(&a, &b);
                prop_assert_eq!(a.is_some(), matching == 1);
                if let Some(artifact) = a {
                    prop_assert!(artifact.file_name.starts_with("custom_"));
                }
            }
            (Err(_), Err(_)) => prop_assert!(matching > 1),
            _ => prop_assert!(false, "selection changed between calls"),
        }
    }
}
