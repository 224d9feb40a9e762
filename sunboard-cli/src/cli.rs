use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use sunboard_core::{
    Config, DisplayMode, RefreshConfig, RefreshHandle, RefreshOrchestrator, Renderer,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::terminal::TerminalRenderer;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "sunboard", version, about = "Who's got sun? Current and peak weather for a set of cities")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the WeatherAPI.com key.
    Configure {
        /// Key to store; prompts when omitted.
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Fetch every city once and print the cards.
    Show {
        /// "current" or "peak".
        #[arg(long, default_value = "current")]
        mode: DisplayMode,
    },

    /// Keep the board open, refreshing on a timer.
    ///
    /// Type `r` to refresh, `t` to toggle current/peak, `q` to quit.
    Watch {
        #[arg(long, default_value = "current")]
        mode: DisplayMode,

        /// Disable the periodic refresh; only `r` fetches.
        #[arg(long)]
        manual: bool,
    },

    /// List configured cities.
    Cities,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };
        let mut config = Config::load_from(&path)?;

        match self.command {
            Command::Configure { api_key } => {
                let api_key = match api_key {
                    Some(key) => key,
                    None => Password::new("WeatherAPI.com key:")
                        .with_display_mode(PasswordDisplayMode::Masked)
                        .without_confirmation()
                        .prompt()
                        .context("Failed to read API key")?,
                };

                config.set_api_key(api_key.trim().to_string());
                config.credential()?;
                config.save_to(&path)?;
                println!("Saved key to {}", path.display());
            }
            Command::Show { mode } => {
                let orchestrator = orchestrator(&config);
                orchestrator.set_display_mode(mode).await;
                let summary = match orchestrator.refresh_all().await {
                    Ok(summary) => summary,
                    // Already printed by the renderer.
                    Err(err) => std::process::exit(if err.is_configuration() { 2 } else { 1 }),
                };
                if summary.ok_count() == 0 {
                    bail!("No city could be loaded.");
                }
            }
            Command::Watch { mode, manual } => {
                let orchestrator = Arc::new(orchestrator(&config));
                orchestrator.set_display_mode(mode).await;
                watch(orchestrator, &config, manual).await?;
            }
            Command::Cities => {
                for city in &config.cities {
                    println!("{:<12} {:<16} {}", city.id, city.name, city.query);
                }
            }
        }

        Ok(())
    }
}

fn orchestrator(config: &Config) -> RefreshOrchestrator {
    let renderer: Arc<dyn Renderer> = Arc::new(TerminalRenderer);
    RefreshOrchestrator::from_config(config, renderer)
}

async fn watch(
    orchestrator: Arc<RefreshOrchestrator>,
    config: &Config,
    manual: bool,
) -> anyhow::Result<()> {
    let refresh = RefreshConfig { auto_refresh: !manual, ..RefreshConfig::from(config) };
    let handle = RefreshHandle::spawn(Arc::clone(&orchestrator), refresh);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match line.trim() {
            "r" | "refresh" => handle.request_refresh().await,
            "t" | "toggle" => {
                let mode = orchestrator.toggle_display_mode().await;
                println!("Showing {mode} readings");
            }
            "c" | "current" => orchestrator.set_display_mode(DisplayMode::Current).await,
            "p" | "peak" => orchestrator.set_display_mode(DisplayMode::Peak).await,
            "q" | "quit" => break,
            "" => {}
            other => println!("Unknown command '{other}'. Use r, t, c, p or q."),
        }
    }

    handle.shutdown().await;
    Ok(())
}
