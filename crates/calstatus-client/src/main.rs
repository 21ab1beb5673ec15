//! calstatus CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use calstatus_client::cli::{Cli, Command, ConfigAction};
use calstatus_client::commands;
use calstatus_client::config::AppConfig;
use calstatus_client::error::ClientResult;
use calstatus_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let tracing = if cli.debug || config.debug {
        TracingConfig::cli_debug()
    } else if matches!(cli.command, Some(Command::Run { once: false, .. })) {
        TracingConfig::poller()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = init_tracing(tracing) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: AppConfig) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);

    match cli.command {
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
        Some(Command::Status {
            meeting_type,
            display,
            json,
        }) => commands::status::run(&config, meeting_type, display, json).await,
        Some(Command::Run {
            meeting_type,
            interval,
            once,
        }) => commands::run::run(&config, meeting_type, interval, once).await,
        Some(Command::Events { meeting_type }) => {
            commands::events::run(&config, meeting_type).await
        }
        None => commands::status::run(&config, None, false, false).await,
    }
}
