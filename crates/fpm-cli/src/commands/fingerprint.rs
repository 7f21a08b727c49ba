//! fingerprint command implementation

use colored::Colorize;
use fpm_core::generator::{apply_params, merge_with_template, parse_resolution};
use fpm_core::{FingerprintConfig, FingerprintGenerator, Overrides, Workspace};
use fpm_fs::NormalizedPath;

use crate::cli::FingerprintArgs;
use crate::context::{open_workspace, user_path};
use crate::error::{CliError, Result};

fn overrides(args: &FingerprintArgs) -> Result<Overrides> {
    let resolution = match &args.resolution {
        Some(value) => Some(parse_resolution(value).map_err(|e| CliError::user(e.to_string()))?),
        None => None,
    };
    Ok(Overrides {
        language: args.language.clone(),
        timezone: args.timezone.clone(),
        resolution,
        location: args.latitude.zip(args.longitude),
    })
}

/// Build a configuration from a template or random values plus overrides.
pub fn build_config(args: &FingerprintArgs) -> Result<FingerprintConfig> {
    let overrides = overrides(args)?;
    match &args.template {
        Some(template) => {
            let template = FingerprintConfig::load(&user_path(template)?)?;
            Ok(merge_with_template(&template, &overrides))
        }
        None => {
            let mut config = FingerprintGenerator::new().random_config();
            apply_params(&mut config, &overrides);
            Ok(config)
        }
    }
}

/// Save a configuration to `output` or its default location.
pub fn save_config(
    workspace: &Workspace,
    config: &FingerprintConfig,
    output: Option<&std::path::Path>,
) -> Result<NormalizedPath> {
    let path = match output {
        Some(path) => user_path(path)?,
        None => workspace.fingerprint_path(&config.id),
    };
    config.save(&path)?;
    tracing::info!(path = %path, id = %config.id, "Saved fingerprint configuration");
    Ok(path)
}

/// Generate a configuration and save it.
pub fn run_fingerprint(root: &NormalizedPath, args: &FingerprintArgs) -> Result<NormalizedPath> {
    let workspace = open_workspace(root)?;
    let config = build_config(args)?;
    let path = save_config(&workspace, &config, args.output.as_deref())?;

    println!(
        "{} Fingerprint {} saved to {}",
        "OK".green().bold(),
        config.id.cyan(),
        path.as_str().cyan()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpm_core::Category;
    use tempfile::TempDir;

    #[test]
    fn random_config_honors_overrides() {
        let args = FingerprintArgs {
            timezone: Some("Asia/Tokyo".to_string()),
            resolution: Some("1280x720".to_string()),
            ..Default::default()
        };
        let config = build_config(&args).unwrap();

        let tz = &config.settings[&Category::Timezone];
        assert_eq!(tz.params["timezone"], "Asia/Tokyo");
        assert_eq!(config.settings[&Category::ScreenResolution].params["width"], 1280);
    }

    #[test]
    fn invalid_resolution_is_a_user_error() {
        let args = FingerprintArgs {
            resolution: Some("wide".to_string()),
            ..Default::default()
        };
        assert!(matches!(build_config(&args), Err(CliError::User { .. })));
    }

    #[test]
    fn default_output_lives_in_configs() {
        let temp = TempDir::new().unwrap();
        let path = run_fingerprint(&NormalizedPath::new(temp.path()), &FingerprintArgs::default()).unwrap();

        assert!(path.as_str().contains("/configs/fingerprint_"));
        assert!(FingerprintConfig::load(&path).is_ok());
    }
}
