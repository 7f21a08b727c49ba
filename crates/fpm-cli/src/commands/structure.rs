//! create_structure command implementation

use colored::Colorize;
use fpm_fs::NormalizedPath;

use crate::context::open_workspace;
use crate::error::Result;

/// Create the workspace directories under `root`.
pub fn run_create_structure(root: &NormalizedPath) -> Result<()> {
    let workspace = open_workspace(root)?;
    let created = workspace.create_structure()?;

    if created.is_empty() {
        println!("{} Directory structure already present", "=".dimmed());
    } else {
        for dir in &created {
            println!("  {} {}", "+".green(), dir.as_str().dimmed());
        }
        println!(
            "{} Created {} directories under {}",
            "OK".green().bold(),
            created.len(),
            root.as_str().cyan()
        );
    }

    if !workspace.layout().src().is_dir() {
        println!(
            "{} No source tree at {}; check out Chromium there before applying",
            "!".yellow(),
            workspace.layout().src().as_str().yellow()
        );
    }
    Ok(())
}
