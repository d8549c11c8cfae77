use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use surge_config::{ConfigLoader, ExportDestination, LogLevel, SurgeConfig};
use surge_logging::init_logging_from_config;
use tracing::{debug, info, warn};

mod cli;
mod commands;

use cli::{Cli, Commands, ConfigCommands};
use commands::verify::VerifyOptions;

/// Load configuration from file or use defaults
fn load_config(config_path: Option<&PathBuf>) -> Result<SurgeConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) => {
            if path.exists() {
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

    // Load configuration first
    let mut config = load_config(cli.config.as_ref())?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.parse::<LogLevel>().map_err(anyhow::Error::msg)?;
    }
    init_logging_from_config(&config.logging)?;
    info!("surge {} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(Commands::Export {
            input,
            destination,
            batch_size,
        }) => {
            let mut export = config.export.clone();
            if let Some(destination) = destination {
                export.destination = ExportDestination::parse_shorthand(&destination);
            }
            if let Some(batch_size) = batch_size {
                export.batch_size = batch_size;
            }
            let summary = commands::export::handle_export(&export, &input).await?;
            if summary.failed() > 0 {
                return Err(anyhow::anyhow!(
                    "{} of {} documents were rejected",
                    summary.failed(),
                    summary.documents
                ));
            }
            Ok(())
        }
        Some(Commands::Flatten { input, max_depth }) => {
            let depth = max_depth.unwrap_or(config.export.max_action_depth);
            commands::flatten::handle_flatten(&input, depth).await?;
            Ok(())
        }
        Some(Commands::Verify {
            repo_dir,
            concurrency,
            pattern,
            skip_list,
            failed,
            dry_run,
        }) => {
            let options = VerifyOptions {
                repo_dir,
                concurrency,
                pattern,
                skip_list,
                failed,
                dry_run,
            };
            let code = commands::verify::handle_verify(&config.verification, options).await?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Some(Commands::Config { config_cmd }) => match config_cmd {
            ConfigCommands::Validate { path } => {
                commands::config::handle_config_validate(&path)?;
                println!("Configuration file is valid");
                Ok(())
            }
            ConfigCommands::Generate { path, force } => {
                if let Some(sample) = commands::config::handle_config_generate(path.as_deref(), force)? {
                    print!("{}", sample);
                }
                Ok(())
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
