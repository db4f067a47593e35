//! config validate, generate and show

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{error, info};

use stampede_config::{ConfigLoader, StampedeConfig};

/// Handle configuration validation
pub fn handle_config_validate(config_file: &Path) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        anyhow::bail!("Configuration file not found: {:?}", config_file);
    }

    match ConfigLoader::new().from_file(config_file) {
        Ok(_config) => {
            println!("✅ Configuration file is valid");
            info!("Configuration validation passed");
            Ok(())
        }
        Err(e) => {
            println!("❌ Configuration validation failed: {}", e);
            error!("Configuration validation failed: {}", e);
            Err(e).context(format!("Invalid configuration in {:?}", config_file))
        }
    }
}

/// Handle configuration generation
pub fn handle_config_generate(output: Option<&Path>, force: bool) -> Result<()> {
    let sample = StampedeConfig::generate_sample();

    let Some(output) = output else {
        print!("{}", sample);
        return Ok(());
    };

    info!("Generating configuration at: {:?}", output);
    if output.exists() && !force {
        anyhow::bail!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        );
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    fs::write(output, sample).context("Failed to write configuration file")?;

    println!("✅ Configuration generated at: {:?}", output);
    println!(
        "🔧 Validate with: stampede config validate --config-file {:?}",
        output
    );
    Ok(())
}

/// Handle configuration display
pub fn handle_config_show(config: &StampedeConfig, format: &str) -> Result<()> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

fn render_config(config: &StampedeConfig, format: &str) -> Result<String> {
    match format.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::to_string(config).context("Failed to serialize to YAML"),
        "json" => serde_json::to_string_pretty(config).context("Failed to serialize to JSON"),
        _ => anyhow::bail!("Unknown output format: {}. Valid formats: yaml, json", format),
    }
}
