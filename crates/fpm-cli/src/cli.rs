//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Fingerprint patch manager - apply and restore Chromium fingerprint patches
#[derive(Parser, Debug)]
#[command(name = "fpm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Workspace base directory (holds src/, patches/, configs/, backups/)
    #[arg(long, global = true, env = "FPM_ROOT")]
    pub root: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Where the configuration for an apply comes from.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct ConfigSource {
    /// Fingerprint configuration file (JSON)
    #[arg(long, conflicts_with = "random", required_unless_present = "random")]
    pub config: Option<PathBuf>,

    /// Generate and save a random configuration, then use it
    #[arg(long)]
    pub random: bool,
}

/// Overrides for generated configurations.
#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct FingerprintArgs {
    /// Output file (default: configs/fingerprint_<id>.json)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Start from this template instead of random values
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Browser language, e.g. zh-CN
    #[arg(long)]
    pub language: Option<String>,

    /// IANA timezone, e.g. Asia/Shanghai
    #[arg(long)]
    pub timezone: Option<String>,

    /// Screen resolution as WIDTHxHEIGHT, e.g. 1920x1080
    #[arg(long)]
    pub resolution: Option<String>,

    /// Geolocation latitude
    #[arg(long, requires = "longitude", allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    /// Geolocation longitude
    #[arg(long, requires = "latitude", allow_negative_numbers = true)]
    pub longitude: Option<f64>,
}

/// Coordinates of a patch to author.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct GenerateArgs {
    /// Fingerprint category, e.g. timezone
    #[arg(long)]
    pub category: String,

    /// Target file, relative to src/
    #[arg(long)]
    pub file: String,

    /// Patch mode, e.g. custom, noise
    #[arg(long)]
    pub mode: String,

    /// Patch name
    #[arg(long)]
    pub name: String,

    /// Use this modified copy instead of opening an editor
    #[arg(long)]
    pub modified: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Create the patches/, configs/ and backups/ directory structure
    #[command(name = "create_structure", visible_alias = "init")]
    CreateStructure,

    /// Apply the patches a configuration selects
    ///
    /// Examples:
    ///   fpm apply --config configs/fingerprint_1234.json
    ///   fpm apply --random
    Apply {
        #[command(flatten)]
        source: ConfigSource,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Restore every file changed by the latest apply
    Restore {
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Author a new patch by editing a copy of a source file
    Generate(GenerateArgs),

    /// Write configs/template.json with every category in default mode
    Template,

    /// Generate a fingerprint configuration
    ///
    /// Examples:
    ///   fpm fingerprint
    ///   fpm fingerprint --language zh-CN --timezone Asia/Shanghai
    ///   fpm fingerprint --template configs/template.json --resolution 1920x1080
    Fingerprint(FingerprintArgs),

    /// Apply, run a build command in src/, then restore
    ///
    /// Example:
    ///   fpm build --random --build-args "autoninja -C out/Default chrome"
    Build {
        #[command(flatten)]
        source: ConfigSource,

        /// Build command and its arguments
        #[arg(long, allow_hyphen_values = true)]
        build_args: String,

        /// Leave the patches applied after the build
        #[arg(long)]
        skip_restore: bool,
    },

    /// Show ledger sessions and live backups
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    ///
    /// Examples:
    ///   fpm completions bash > ~/.local/share/bash-completion/completions/fpm
    ///   fpm completions zsh > ~/.zfunc/_fpm
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
