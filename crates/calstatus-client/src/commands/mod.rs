//! Subcommand implementations.

pub mod config;
pub mod events;
pub mod run;
pub mod status;

use std::time::Duration;

use calstatus_core::DisplayFormatter;
use calstatus_server::{DisplayCommand, PollCycle, StatusCache};

use crate::config::AppConfig;
use crate::error::ClientResult;
use crate::sources::{build_adapters, build_reconciler};

pub(crate) fn formatter(config: &AppConfig) -> ClientResult<DisplayFormatter> {
    let formatter = DisplayFormatter::new(config.display.max_length, config.zone()?);
    Ok(match &config.display.busy_prefix {
        Some(prefix) => formatter.with_busy_prefix(prefix.clone()),
        None => formatter,
    })
}

/// Builds the poll cycle described by `config`, which must validate.
pub(crate) fn poll_cycle(config: &AppConfig) -> ClientResult<PollCycle> {
    config.validate()?;
    let zone = config.zone()?;
    Ok(PollCycle::new(
        build_adapters(config, zone),
        build_reconciler(config),
        formatter(config)?,
    )
    .with_mode(config.display.mode)
    .with_assets(config.display.assets.clone())
    .with_cache(StatusCache::new(config.schedule.cache_ttl())))
}

pub(crate) fn display_command(config: &AppConfig) -> DisplayCommand {
    let display = &config.display;
    DisplayCommand::new(display.program.clone())
        .with_base_args(display.base_args.clone())
        .with_text_args(display.text_args.clone())
        .with_asset_args(display.asset_args.clone())
        .with_timeout(Duration::from_secs(display.timeout_secs))
}
