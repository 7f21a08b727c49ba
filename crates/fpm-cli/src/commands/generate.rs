//! generate command implementation
//!
//! Authors a patch either from a modified copy given on the command line or
//! by opening the target's content in `$EDITOR`.

use std::fs;
use std::path::Path;
use std::process::Command;

use colored::Colorize;
use dialoguer::Confirm;
use fpm_core::{Category, Error as CoreError, PatchRequest};
use fpm_fs::NormalizedPath;

use crate::cli::GenerateArgs;
use crate::context::{open_workspace, user_path};
use crate::error::{CliError, Result};

fn default_editor() -> &'static str {
    if cfg!(windows) { "notepad" } else { "nano" }
}

/// Open `path` in the user's editor and wait for it to exit.
fn edit(path: &Path) -> Result<()> {
    let editor = std::env::var("EDITOR")
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| default_editor().to_string());
    let mut parts = editor.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| CliError::user("EDITOR is empty"))?;

    tracing::debug!(editor = %editor, file = %path.display(), "Launching editor");
    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .map_err(|e| CliError::user(format!("failed to launch editor '{editor}': {e}")))?;
    if !status.success() {
        return Err(CliError::user(format!("editor '{editor}' exited with {status}")));
    }
    Ok(())
}

/// Copy the original into a temp file, let the user edit it, return the
/// edited content.
fn edit_copy(target: &str, original: &str) -> Result<String> {
    let extension = Path::new(target)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let temp = tempfile::Builder::new()
        .prefix("fpm-edit-")
        .suffix(&extension)
        .tempfile()?;
    fs::write(temp.path(), original)?;

    println!("Opening {} in editor...", target.cyan());
    edit(temp.path())?;

    let done = Confirm::new()
        .with_prompt("Finished editing?")
        .default(true)
        .interact()?;
    if !done {
        return Err(CliError::user("patch generation cancelled"));
    }
    Ok(fs::read_to_string(temp.path())?)
}

/// Create a patch artifact for one target file.
pub fn run_generate(root: &NormalizedPath, args: &GenerateArgs) -> Result<NormalizedPath> {
    let category: Category = args
        .category
        .parse()
        .map_err(|e: CoreError| CliError::user(e.to_string()))?;
    let request = PatchRequest {
        category,
        mode: args.mode.clone(),
        name: args.name.clone(),
        target_file: args.file.clone(),
    };

    let workspace = open_workspace(root)?;
    let author = workspace.author();
    let original = author.original(&request)?;

    let modified = match &args.modified {
        Some(path) => fs::read_to_string(user_path(path)?.to_native())?,
        None => edit_copy(&request.target_file, &original)?,
    };

    let path = match author.write(&request, &modified) {
        Ok(path) => path,
        Err(CoreError::NoChanges { .. }) => {
            return Err(CliError::user("file was not modified; no patch generated"));
        }
        Err(e) => return Err(e.into()),
    };

    println!("{} Patch written to {}", "OK".green().bold(), path.as_str().cyan());
    println!();
    println!("Select it from a configuration with:");
    println!("  \"{}\": {{", category);
    println!("    \"enabled\": true,");
    println!("    \"mode\": \"{}\",", request.mode);
    println!("    \"params\": {{}}");
    println!("  }}");
    Ok(path)
}
