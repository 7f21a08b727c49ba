//! Status command implementation

use colored::Colorize;
use fpm_core::{ApplicationSession, BackupEntry};
use fpm_fs::NormalizedPath;
use serde::Serialize;

use crate::context::open_workspace;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct SessionSummary {
    id: String,
    state: String,
    applied_time: String,
    records: usize,
    file: Option<String>,
}

impl From<&ApplicationSession> for SessionSummary {
    fn from(session: &ApplicationSession) -> Self {
        Self {
            id: session.id.clone(),
            state: session.state.to_string(),
            applied_time: session.applied_time.to_rfc3339(),
            records: session.patches.len(),
            file: session.file.as_ref().map(|f| f.as_str().to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusReport {
    root: String,
    initialized: bool,
    sessions: Vec<SessionSummary>,
    backups: Vec<BackupEntry>,
}

/// Run the status command
pub fn run_status(root: &NormalizedPath, json: bool) -> Result<()> {
    let workspace = open_workspace(root)?;
    let sessions = workspace.ledger().sessions()?;
    let backups = workspace.vault().list()?;

    let report = StatusReport {
        root: root.as_str().to_string(),
        initialized: workspace.layout().is_initialized(),
        sessions: sessions.iter().map(SessionSummary::from).collect(),
        backups,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Patch Manager Status".bold());
    println!();
    println!("{}:   {}", "Path".dimmed(), report.root);
    if !report.initialized {
        println!();
        println!("{}", "Not initialized".red().bold());
        println!("Run {} to create the directory structure.", "fpm create_structure".cyan());
        return Ok(());
    }
    println!();

    println!("{}:", "Sessions".bold());
    if report.sessions.is_empty() {
        println!("  {}", "None".dimmed());
    }
    for session in &report.sessions {
        let state = if session.state == "applied" {
            session.state.yellow()
        } else {
            session.state.green()
        };
        println!(
            "  {} {} ({}, {} records) {}",
            "*".dimmed(),
            session.id.cyan(),
            state,
            session.records,
            session.applied_time.dimmed()
        );
    }
    println!();

    println!("{}:", "Live Backups".bold());
    if report.backups.is_empty() {
        println!("  {}", "None".dimmed());
    }
    for entry in &report.backups {
        println!(
            "  {} {} {}",
            "+".green(),
            entry.path,
            entry.captured_at.to_rfc3339().dimmed()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn status_not_initialized() {
        let temp = TempDir::new().unwrap();
        assert!(run_status(&NormalizedPath::new(temp.path()), false).is_ok());
    }

    #[test]
    fn status_json() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("patches")).unwrap();
        assert!(run_status(&NormalizedPath::new(temp.path()), true).is_ok());
    }
}
