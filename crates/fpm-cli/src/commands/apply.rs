//! apply command implementation

use colored::Colorize;
use fpm_core::{ApplyReport, FingerprintConfig, FingerprintGenerator, Workspace};
use fpm_fs::NormalizedPath;

use super::fingerprint::save_config;
use crate::cli::ConfigSource;
use crate::context::{open_workspace, user_path};
use crate::error::{CliError, Result};

/// Load the configuration named by `source`, generating and saving a random
/// one for `--random`.
pub fn resolve_config(workspace: &Workspace, source: &ConfigSource) -> Result<FingerprintConfig> {
    match (&source.config, source.random) {
        (Some(path), _) => Ok(FingerprintConfig::load(&user_path(path)?)?),
        (None, true) => {
            let config = FingerprintGenerator::new().random_config();
            let path = save_config(workspace, &config, None)?;
            println!("{} Random configuration saved to {}", "+".green(), path.as_str().cyan());
            Ok(config)
        }
        (None, false) => Err(CliError::user("either --config or --random is required")),
    }
}

/// Print a human-readable apply report.
pub fn print_apply_report(report: &ApplyReport) {
    println!("{}", "Applied".bold());
    if report.applied.is_empty() {
        println!("  {}", "None".dimmed());
    }
    for record in &report.applied {
        println!(
            "  {} {} {}",
            "+".green(),
            record.category.to_string().cyan(),
            record.target_file
        );
    }

    if !report.skipped.is_empty() {
        println!("{}", "Skipped (no patch for mode)".bold());
        for skipped in &report.skipped {
            println!(
                "  {} {} [{}] {}",
                "-".yellow(),
                skipped.category.to_string().cyan(),
                skipped.mode,
                skipped.target.dimmed()
            );
        }
    }

    if !report.failures.is_empty() {
        println!("{}", "Failed".bold());
        for failure in &report.failures {
            println!(
                "  {} {} {} ({}): {}",
                "x".red(),
                failure.category.to_string().cyan(),
                failure.target,
                failure.kind.to_string().red(),
                failure.message
            );
        }
    }

    let untouched = report.skipped_categories();
    if !untouched.is_empty() {
        let names: Vec<String> = untouched.iter().map(ToString::to_string).collect();
        println!("{} {}", "Nothing applied for:".dimmed(), names.join(", "));
    }

    println!();
    let summary = format!(
        "{} applied, {} skipped, {} failed, {} categories inactive",
        report.applied.len(),
        report.skipped.len(),
        report.failures.len(),
        report.inactive_categories.len()
    );
    if report.has_failures() {
        println!("{} {}", "!".yellow().bold(), summary.yellow());
    } else {
        println!("{} {}", "OK".green().bold(), summary);
    }
    println!("Session {} recorded in {}", report.session_id.cyan(), report.record_path.as_str().dimmed());
}

/// Apply the selected configuration.
pub fn run_apply(root: &NormalizedPath, source: &ConfigSource, json: bool) -> Result<ApplyReport> {
    let workspace = open_workspace(root)?;
    let config = resolve_config(&workspace, source)?;
    let report = workspace.orchestrator().apply(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_apply_report(&report);
    }
    Ok(report)
}
