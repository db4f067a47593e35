use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use stampede_config::{ConfigLoader, LogLevel, StampedeConfig};
use stampede_logging::{init_logging_from_config, init_worker_tracing};

mod cli;
mod commands;

use cli::{Cli, Commands, ConfigCommands};
use commands::bench::{run_magic, run_manual, run_stress};
use commands::config::{handle_config_generate, handle_config_show, handle_config_validate};

fn load_config(config_path: Option<&PathBuf>) -> Result<StampedeConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) => {
            if path.exists() {
                info!("Loading configuration from: {:?}", path);
                loader
                    .from_file(path)
                    .context(format!("Failed to load configuration from {:?}", path))
            } else {
                warn!("Configuration file not found: {:?}. Using defaults.", path);
                loader
                    .from_env()
                    .context("Failed to load configuration from environment")
            }
        }
        None => {
            debug!("No configuration file specified. Loading from environment or defaults.");
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level
            .parse::<LogLevel>()
            .map_err(anyhow::Error::msg)
            .context("Invalid --log-level")?;
    }
    if let Some(command) = &cli.command {
        command.apply(&mut config);
        config
            .validate_all()
            .context("Invalid configuration after applying command-line flags")?;
    }

    // The worker daemon logs with thread ids; everything else follows config
    if matches!(cli.command, Some(Commands::Worker { .. })) {
        init_worker_tracing(cli.log_level.as_deref())?;
    } else {
        init_logging_from_config(&config.logging)?;
    }

    match &cli.command {
        Some(Commands::Worker { .. }) => {
            info!("Stampede worker starting");
            stampede_runtime::worker_main(&config.worker)
                .await
                .context("Worker daemon failed")
        }
        Some(Commands::Manual { .. }) => run_manual(&config).await,
        Some(Commands::Stress { .. }) => run_stress(&config).await,
        Some(Commands::Magic { .. }) => run_magic(&config).await,
        Some(Commands::Config { config_cmd }) => match config_cmd {
            ConfigCommands::Validate { config_file } => handle_config_validate(config_file),
            ConfigCommands::Generate { output, force } => {
                handle_config_generate(output.as_deref(), *force)
            }
            ConfigCommands::Show {
                config_file,
                format,
            } => {
                let shown = match config_file {
                    Some(path) => load_config(Some(path))?,
                    None => config.clone(),
                };
                handle_config_show(&shown, format)
            }
        },
        None => {
            // If no subcommand is provided, print help
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().context("Failed to print help")?;
            println!();
            Ok(())
        }
    }
}
