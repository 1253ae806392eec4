// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config commands

use anyhow::Result;
use clap::{Args, Subcommand};
use mq_core::CoordinatorConfig;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show {
        /// Print JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

pub fn config(args: ConfigArgs, config: &CoordinatorConfig) -> Result<()> {
    match args.command {
        ConfigCommand::Show { json } => {
            let rendered = if json {
                serde_json::to_string_pretty(config)?
            } else {
                config.to_toml_string()?
            };
            println!("{}", rendered.trim_end());
        }
    }
    Ok(())
}
