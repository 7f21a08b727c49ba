//! template command implementation

use colored::Colorize;
use fpm_core::template_config;
use fpm_fs::NormalizedPath;

use crate::context::open_workspace;
use crate::error::Result;

/// Write `configs/template.json`, replacing any existing template.
pub fn run_template(root: &NormalizedPath) -> Result<NormalizedPath> {
    let workspace = open_workspace(root)?;
    let path = workspace.template_path();
    if path.exists() {
        tracing::warn!(path = %path, "Overwriting existing template");
    }
    template_config().save(&path)?;

    println!("{} Template written to {}", "OK".green().bold(), path.as_str().cyan());
    Ok(path)
}
