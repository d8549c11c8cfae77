//! `surge config`

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;
use surge_config::{ConfigLoader, SurgeConfig};

/// Handle configuration validation
pub fn handle_config_validate(config_file: &Path) -> Result<SurgeConfig> {
    if !config_file.exists() {
        return Err(anyhow!("Configuration file not found: {:?}", config_file));
    }

    let config = ConfigLoader::new()
        .from_file(config_file)
        .with_context(|| format!("Configuration validation failed for {:?}", config_file))?;
    tracing::info!("Configuration validation passed");
    Ok(config)
}

/// Handle configuration generation
///
/// Writes the sample to `output`, or returns it for printing when no path
/// is given.
pub fn handle_config_generate(output: Option<&Path>, force: bool) -> Result<Option<String>> {
    let sample = SurgeConfig::generate_sample();
    let Some(output) = output else {
        return Ok(Some(sample));
    };

    if output.exists() && !force {
        return Err(anyhow!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        ));
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    fs::write(output, sample).with_context(|| format!("Failed to write {:?}", output))?;
    tracing::info!("Generated configuration at {:?}", output);
    Ok(None)
}
