//! Configuration view and validation commands: `command-center config`.

use std::path::Path;

use anyhow::{Context, Result};

use command_center::config::{self, Settings};

use super::super::ConfigCommands;

pub fn cmd_config(
    settings: &Settings,
    explicit: Option<&Path>,
    command: Option<ConfigCommands>,
) -> Result<()> {
    let config_path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_config_path);

    match command {
        None | Some(ConfigCommands::Show) => {
            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No config file at {} (using defaults)", config_path.display());
            }
            println!();
            println!("Effective values (with env/CLI overrides):");
            println!();
            let mut shown = settings.clone();
            if shown.server.jwt_secret != config::DEFAULT_JWT_SECRET {
                shown.server.jwt_secret = "********".to_string();
            }
            print!(
                "{}",
                toml::to_string_pretty(&shown).context("Failed to serialize configuration")?
            );
            println!();
            println!("data_dir = {}", settings.data_dir().display());
        }
        Some(ConfigCommands::Validate) => {
            let warnings = settings.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("config.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }
            Settings::default().save(&config_path)?;
            println!("Created config.toml at {}", config_path.display());
        }
    }

    Ok(())
}
