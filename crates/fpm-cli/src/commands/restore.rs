//! restore command implementation

use colored::Colorize;
use fpm_core::RestoreReport;
use fpm_fs::NormalizedPath;

use crate::context::open_workspace;
use crate::error::Result;

/// Print a human-readable restore report.
pub fn print_restore_report(report: &RestoreReport) {
    let Some(session) = &report.session_id else {
        println!("{} Nothing to restore", "=".dimmed());
        return;
    };

    for target in &report.restored {
        println!("  {} {}", "+".green(), target);
    }
    for failure in &report.failures {
        println!(
            "  {} {} ({}): {}",
            "x".red(),
            failure.target,
            failure.kind.to_string().red(),
            failure.message
        );
    }

    let summary = format!(
        "Session {} restored: {} files, {} failures",
        session,
        report.restored.len(),
        report.failures.len()
    );
    if report.has_failures() {
        println!("{} {}", "!".yellow().bold(), summary.yellow());
    } else {
        println!("{} {}", "OK".green().bold(), summary);
    }
}

/// Restore the latest applied session.
pub fn run_restore(root: &NormalizedPath, json: bool) -> Result<RestoreReport> {
    let workspace = open_workspace(root)?;
    let report = workspace.orchestrator().restore()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_restore_report(&report);
    }
    Ok(report)
}
