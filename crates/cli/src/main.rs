//! `tracerail` binary.
//!
//! Without a subcommand it starts the interactive TUI; the subcommands run
//! headless and print to stdout.

mod cli;
mod commands;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::eyre;
use tr_core::config::loader::{data_dir, load_config};
use tr_core::config::models::ConfigOverrides;
use tracing::debug;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        config_path: cli.config,
        gateway_url: cli.gateway,
    };

    let Some(command) = cli.command else {
        let (_guard, log_path) = logging::init_file(&data_dir())?;
        let config = load_config(&overrides)?;
        debug!(log = %log_path.display(), "logging to file");
        tr_tui::run_app(config)
            .await
            .map_err(|e| eyre!(e))?;
        return Ok(ExitCode::SUCCESS);
    };

    logging::init_stderr();
    let config = load_config(&overrides)?;
    debug!(source = ?config.source, history = %config.history_path.display(), "configuration loaded");

    match command {
        Command::Run(args) => commands::run::execute(&config, args).await,
        Command::Pipeline { command } => {
            commands::pipeline::execute(&config, command).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::History { command } => {
            commands::history::execute(&config, command)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
