//! Fingerprint Patch Manager CLI
//!
//! Applies, restores and authors the fingerprint patches of a Chromium
//! source tree.

mod cli;
mod commands;
mod context;
mod error;

use std::path::Path;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::resolve_root;
use error::Result;

fn main() {
    match run() {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("{}: tracing subscriber already installed", "warning".yellow());
    }
    tracing::debug!("Verbose mode enabled");
}

/// Returns the process exit code.
fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(cmd) => execute_command(cmd, cli.root.as_deref()),
        None => {
            println!("{} Fingerprint Patch Manager", "fpm".green().bold());
            println!();
            println!("Run {} for available commands.", "fpm --help".cyan());
            Ok(0)
        }
    }
}

fn execute_command(cmd: Commands, root: Option<&Path>) -> Result<i32> {
    if let Commands::Completions { shell } = cmd {
        clap_complete::generate(shell, &mut Cli::command(), "fpm", &mut std::io::stdout());
        return Ok(0);
    }

    let root = resolve_root(root)?;
    match cmd {
        Commands::CreateStructure => commands::run_create_structure(&root)?,
        Commands::Apply { source, json } => {
            commands::run_apply(&root, &source, json)?;
        }
        Commands::Restore { json } => {
            commands::run_restore(&root, json)?;
        }
        Commands::Generate(args) => {
            commands::run_generate(&root, &args)?;
        }
        Commands::Template => {
            commands::run_template(&root)?;
        }
        Commands::Fingerprint(args) => {
            commands::run_fingerprint(&root, &args)?;
        }
        Commands::Build {
            source,
            build_args,
            skip_restore,
        } => return commands::run_build(&root, &source, &build_args, skip_restore),
        Commands::Status { json } => commands::run_status(&root, json)?,
        Commands::Completions { .. } => {}
    }
    Ok(0)
}
