use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use wxbatch_core::{BatchOrchestrator, Config, Envelope};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxbatch", version, about = "Concurrent weather lookups for many locations")]
pub struct Cli {
    /// Read configuration from this file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and default locations.
    Configure,

    /// Fetch weather for the given locations once and print it as JSON.
    Fetch {
        /// Location names; the configured list is used when empty.
        locations: Vec<String>,
    },

    /// Serve the configured locations over HTTP.
    Serve {
        /// Port to listen on; overrides config and $PORT.
        #[arg(long)]
        port: Option<u16>,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        match self.command {
            Command::Configure => configure(config, self.config),
            Command::Fetch { locations } => {
                let config = config.apply_env()?;
                let locations = if locations.is_empty() {
                    config.locations.clone()
                } else {
                    locations
                };

                let batch = BatchOrchestrator::from_config(&config)?;
                let records = batch.fetch_all(&locations).await;

                let json = serde_json::to_string_pretty(&Envelope::success(records))
                    .context("Failed to serialize weather records")?;
                println!("{json}");
                Ok(())
            }
            Command::Serve { port, host } => {
                let mut config = config.apply_env()?;
                if let Some(port) = port {
                    config.port = port;
                }

                let addr: SocketAddr = format!("{host}:{}", config.port)
                    .parse()
                    .with_context(|| format!("Invalid listen address {host}:{}", config.port))?;
                let batch = BatchOrchestrator::from_config(&config)?;

                server::serve(addr, batch, config.locations).await
            }
        }
    }
}

fn configure(mut config: Config, path: Option<PathBuf>) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let locations = Text::new("Locations (comma separated):")
        .with_default(&config.locations.join(", "))
        .prompt()
        .context("Failed to read locations")?;

    config.api_key = Some(api_key.trim().to_string());
    config.locations = parse_locations(&locations);

    let saved = match path {
        Some(path) => config.save_to(&path).map(|_| path)?,
        None => config.save()?,
    };
    println!("Configuration saved to {}", saved.display());

    Ok(())
}

fn parse_locations(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
