//! build command implementation
//!
//! Apply, run the build in `src/`, restore. The restore runs whatever the
//! build outcome unless `--skip-restore` is given.

use std::process::Command;
use std::time::Instant;

use colored::Colorize;
use fpm_fs::NormalizedPath;

use super::apply::{print_apply_report, resolve_config};
use super::restore::print_restore_report;
use crate::cli::ConfigSource;
use crate::context::open_workspace;
use crate::error::{CliError, Result};

/// Run the build command, returning its exit code.
fn run_build_command(src: &NormalizedPath, build_args: &str) -> Result<i32> {
    let mut parts = build_args.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| CliError::user("--build-args must name a build command"))?;

    if cfg!(windows) && !matches!(program.to_ascii_lowercase().as_str(), "ninja" | "autoninja") {
        println!("{} ninja or autoninja is recommended on Windows", "!".yellow());
    }

    println!("{} {}", "Running:".bold(), build_args.cyan());
    let status = Command::new(program)
        .args(parts)
        .current_dir(src.to_native())
        .status()
        .map_err(|e| CliError::user(format!("failed to run build command '{program}': {e}")))?;

    Ok(status.code().unwrap_or(1))
}

/// Apply, build, restore. Returns the process exit code to use.
pub fn run_build(
    root: &NormalizedPath,
    source: &ConfigSource,
    build_args: &str,
    skip_restore: bool,
) -> Result<i32> {
    let workspace = open_workspace(root)?;
    if !workspace.layout().is_initialized() {
        println!("Initializing directory structure...");
        workspace.create_structure()?;
    }

    println!("{}", "===== Applying patches =====".bold());
    let config = resolve_config(&workspace, source)?;
    let report = workspace
        .orchestrator()
        .apply(&config)
        .map_err(|e| CliError::user(format!("apply failed, build aborted: {e}")))?;
    print_apply_report(&report);

    println!();
    println!("{}", "===== Building =====".bold());
    let started = Instant::now();
    let build = run_build_command(workspace.layout().src(), build_args);
    let elapsed = started.elapsed().as_secs_f64();

    match &build {
        Ok(0) => println!(
            "{} Build succeeded in {:.2}s ({:.2} min)",
            "OK".green().bold(),
            elapsed,
            elapsed / 60.0
        ),
        Ok(code) => println!("{} Build failed with exit code {}", "x".red().bold(), code),
        Err(e) => println!("{} {}", "x".red().bold(), e),
    }

    if skip_restore {
        println!("{} Patches left applied (--skip-restore)", "!".yellow());
    } else {
        println!();
        println!("{}", "===== Restoring patches =====".bold());
        match workspace.orchestrator().restore() {
            Ok(restored) => print_restore_report(&restored),
            Err(e) => {
                tracing::error!(error = %e, "Restore after build failed");
                println!("{} Restore failed: {}", "x".red().bold(), e);
                if build.is_ok() {
                    return Err(e.into());
                }
            }
        }
    }

    build
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_build_args_is_a_user_error() {
        let temp = TempDir::new().unwrap();
        let err = run_build_command(&NormalizedPath::new(temp.path()), "  ").unwrap_err();
        assert!(matches!(err, CliError::User { .. }));
    }
}
