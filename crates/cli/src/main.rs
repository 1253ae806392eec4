// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! mq - Mutex queue CLI

mod commands;
mod error;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{config, demo};
use mq_core::CoordinatorConfig;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::MqError;

#[derive(Parser)]
#[command(
    name = "mq",
    version,
    about = "Mutex queue - fair FIFO locks over a per-resource coordinator"
)]
struct Cli {
    /// Coordinator configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Lock namespace, overriding the configuration file
    #[arg(long, global = true)]
    namespace: Option<String>,

    /// Unlock timeout (e.g. "30s", "2m"), overriding the configuration file
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    unlock_timeout: Option<Duration>,

    /// History length that triggers continue-as-new
    #[arg(long, global = true)]
    max_history: Option<usize>,

    /// Log coordinator activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run participants contending for one resource
    Demo(demo::DemoArgs),
    /// Inspect the effective configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Demo(args) => demo::demo(args, config).await?,
        Commands::Config(args) => config::config(args, &config)?,
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<CoordinatorConfig, MqError> {
    let mut config = match &cli.config {
        Some(path) => {
            CoordinatorConfig::load(path).map_err(|e| MqError::config_invalid(path, e))?
        }
        None => CoordinatorConfig::default(),
    };

    if let Some(namespace) = &cli.namespace {
        config = config.with_namespace(namespace.clone());
    }
    if let Some(timeout) = cli.unlock_timeout {
        config = config.with_unlock_timeout(timeout);
    }
    if let Some(max_history) = cli.max_history {
        config = config.with_max_history(max_history);
    }

    config.validate().map_err(MqError::override_invalid)?;
    Ok(config)
}

fn setup_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout carries demo output; logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
