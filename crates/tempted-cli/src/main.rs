// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Config, Overrides};
use std::path::{Path, PathBuf};
use tempted_temporal::{Client, HttpConnector};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHA: Option<&str> = option_env!("TEMPTED_GIT_SHA");

#[derive(Debug, Parser)]
#[command(
    name = "tempted",
    version,
    about = "Terminal dashboard for Temporal workflows"
)]
struct Cli {
    /// Config file path
    #[arg(short = 'c', long = "config", env = "TEMPTED_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Temporal HTTP API address
    #[arg(short = 'a', long, env = "TEMPORAL_ADDRESS")]
    address: Option<String>,

    /// Temporal namespace
    #[arg(short = 'n', long, env = "TEMPORAL_NAMESPACE")]
    namespace: Option<String>,

    /// Seconds between refreshes; -1 disables
    #[arg(
        short = 'u',
        long = "update",
        env = "TEMPTED_UPDATE_SECONDS",
        allow_negative_numbers = true
    )]
    update_seconds: Option<i64>,

    /// Bearer token for the Temporal API
    #[arg(short = 't', long, env = "TEMPORAL_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Print the resolved config path and exit
    #[arg(long)]
    print_config_path: bool,

    /// Print an example config file and exit
    #[arg(long)]
    print_example_config: bool,

    /// Validate configuration and exit without starting the UI
    #[arg(long)]
    check: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            address: self.address.clone(),
            namespace: self.namespace.clone(),
            update_seconds: self.update_seconds,
            token: self.token.clone(),
        }
    }
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };

    if cli.print_config_path {
        println!("{}", config_path.display());
        return Ok(());
    }
    if cli.print_example_config {
        print!("{}", Config::example_config(&config_path));
        return Ok(());
    }

    let app_config = load_app_config(&cli, &config_path)?;

    if cli.check {
        Client::from_config(&app_config).context("check temporal connection settings")?;
        println!("config ok: {}", app_config.target());
        return Ok(());
    }

    if config_path.exists() {
        println!("Using config file: {}", config_path.display());
    }
    if let Some(path) = logging::init()? {
        eprintln!("Debug logging to {}", path.display());
    }
    tracing::info!(endpoint = %app_config.target(), "starting tempted");

    let (mut model, options) = tempted_app::setup(app_config, Box::new(HttpConnector), None);
    tempted_tui::run_app(&mut model, &options)
}

fn load_app_config(cli: &Cli, config_path: &Path) -> Result<tempted_app::Config> {
    let file_config = Config::load(config_path)?;
    let mut app_config = file_config.resolve(&cli.overrides(), |key| std::env::var(key).ok())?;
    app_config.version = VERSION.to_owned();
    app_config.sha = SHA.unwrap_or_default().to_owned();
    Ok(app_config)
}
