//! End-to-end tests that invoke the compiled `fpm` binary.

use assert_cmd::Command;
use fpm_test_utils::{TestTree, git_available};
use predicates::prelude::*;

const TIME_CC: &str = "base/time/time.cc";
const PRISTINE: &str = "int DefaultOffset() { return 0; }\n";
const TOKYO: &str = "int DefaultOffset() { return 540; }\n";

/// `fpm` rooted at `root`, with colors and inherited log filters off.
fn fpm(root: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("fpm").expect("Failed to find fpm binary");
    cmd.arg("--root")
        .arg(root)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("FPM_ROOT");
    cmd
}

fn timezone_tree() -> TestTree {
    let tree = TestTree::new();
    tree.mappings(&[("timezone", &[TIME_CC])]);
    tree.source(TIME_CC, PRISTINE);
    tree.replacement_patch("timezone", "custom_tokyo_time.cc.patch", TIME_CC, TOKYO);
    tree
}

// ============================================================================
// Basics
// ============================================================================

#[test]
fn help_lists_commands() {
    let temp = tempfile::TempDir::new().unwrap();
    fpm(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create_structure"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("restore"));
}

#[test]
fn version_exits_zero() {
    let temp = tempfile::TempDir::new().unwrap();
    fpm(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fpm"));
}

#[test]
fn no_command_prints_hint() {
    let temp = tempfile::TempDir::new().unwrap();
    fpm(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("fpm --help"));
}

#[test]
fn apply_without_source_is_a_usage_error() {
    let temp = tempfile::TempDir::new().unwrap();
    fpm(temp.path()).arg("apply").assert().failure();
}

// ============================================================================
// Workspace setup
// ============================================================================

#[test]
fn create_structure_builds_directories() {
    let temp = tempfile::TempDir::new().unwrap();
    fpm(temp.path()).arg("create_structure").assert().success();

    assert!(temp.path().join("patches/timezone").is_dir());
    assert!(temp.path().join("patches/webgl").is_dir());
    assert!(temp.path().join("configs").is_dir());
    assert!(temp.path().join("backups").is_dir());

    fpm(temp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already present"));
}

#[test]
fn template_writes_default_configuration() {
    let temp = tempfile::TempDir::new().unwrap();
    fpm(temp.path()).arg("template").assert().success();

    let content = std::fs::read_to_string(temp.path().join("configs/template.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value["settings"]["timezone"]["mode"], "default");
}

#[test]
fn fingerprint_writes_to_output() {
    let temp = tempfile::TempDir::new().unwrap();
    let output = temp.path().join("fp.json");
    fpm(temp.path())
        .args(["fingerprint", "--timezone", "Asia/Tokyo", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("saved to"));

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(value["settings"]["timezone"]["mode"], "custom");
}

#[test]
fn fingerprint_with_bad_resolution_fails() {
    let temp = tempfile::TempDir::new().unwrap();
    fpm(temp.path())
        .args(["fingerprint", "--resolution", "wide"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error"));
}

// ============================================================================
// Apply / restore
// ============================================================================

#[test]
fn restore_without_session_is_noop() {
    let temp = tempfile::TempDir::new().unwrap();
    fpm(temp.path())
        .arg("restore")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to restore"));
}

#[test]
fn apply_with_missing_config_fails() {
    let temp = tempfile::TempDir::new().unwrap();
    fpm(temp.path())
        .args(["apply", "--config", "missing.json"])
        .assert()
        .code(1);
}

#[test]
fn apply_then_restore_round_trip() {
    if !git_available() {
        return;
    }
    let tree = timezone_tree();
    let config = tree.config("tz1", &[("timezone", "custom")]);

    fpm(tree.root())
        .arg("apply")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains(TIME_CC));
    tree.assert_source(TIME_CC, TOKYO);
    tree.assert_exists("configs/applied_tz1.json");

    fpm(tree.root())
        .args(["status", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"tz1\""))
        .stdout(predicate::str::contains("\"applied\""));

    fpm(tree.root()).arg("restore").assert().success();
    tree.assert_source(TIME_CC, PRISTINE);
    tree.assert_exists("configs/restored_tz1.json");
    tree.assert_not_exists("configs/applied_tz1.json");
}

#[test]
fn second_apply_is_refused_while_session_outstanding() {
    if !git_available() {
        return;
    }
    let tree = timezone_tree();
    let first = tree.config("one", &[("timezone", "custom")]);
    let second = tree.config("two", &[("timezone", "custom")]);

    fpm(tree.root()).arg("apply").arg("--config").arg(&first).assert().success();
    fpm(tree.root())
        .arg("apply")
        .arg("--config")
        .arg(&second)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("one"));
    tree.assert_source(TIME_CC, TOKYO);
}

#[test]
fn apply_json_reports_records() {
    if !git_available() {
        return;
    }
    let tree = timezone_tree();
    let config = tree.config("tz2", &[("timezone", "custom")]);

    let output = fpm(tree.root())
        .arg("apply")
        .arg("--json")
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["session_id"], "tz2");
    assert_eq!(report["applied"][0]["target_file"], TIME_CC);
    assert_eq!(report["failures"].as_array().unwrap().len(), 0);
}

// ============================================================================
// Build driver
// ============================================================================

#[cfg(unix)]
#[test]
fn build_restores_after_success() {
    if !git_available() {
        return;
    }
    let tree = timezone_tree();
    let config = tree.config("b1", &[("timezone", "custom")]);

    fpm(tree.root())
        .arg("build")
        .arg("--config")
        .arg(&config)
        .args(["--build-args", "true"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Build succeeded"));
    tree.assert_source(TIME_CC, PRISTINE);
    tree.assert_exists("configs/restored_b1.json");
}

#[cfg(unix)]
#[test]
fn build_failure_still_restores() {
    if !git_available() {
        return;
    }
    let tree = timezone_tree();
    let config = tree.config("b2", &[("timezone", "custom")]);

    fpm(tree.root())
        .arg("build")
        .arg("--config")
        .arg(&config)
        .args(["--build-args", "false"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Build failed"));
    tree.assert_source(TIME_CC, PRISTINE);
}

#[cfg(unix)]
#[test]
fn build_with_skip_restore_leaves_patches() {
    if !git_available() {
        return;
    }
    let tree = timezone_tree();
    let config = tree.config("b3", &[("timezone", "custom")]);

    fpm(tree.root())
        .arg("build")
        .arg("--config")
        .arg(&config)
        .args(["--build-args", "true", "--skip-restore"])
        .assert()
        .success();
    tree.assert_source(TIME_CC, TOKYO);
    tree.assert_exists("configs/applied_b3.json");
}

// ============================================================================
// Misc
// ============================================================================

#[test]
fn status_on_fresh_directory() {
    let temp = tempfile::TempDir::new().unwrap();
    fpm(temp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not initialized"));
}

#[test]
fn completions_bash() {
    let temp = tempfile::TempDir::new().unwrap();
    fpm(temp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fpm"));
}
