//! The long-running poll loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::info;

use calstatus_core::MeetingType;
use calstatus_server::{Scheduler, SignalHandler};

use crate::commands::{display_command, poll_cycle};
use crate::config::AppConfig;
use crate::error::{ClientError, ClientResult};

/// Updates the display now and then on every tick until SIGINT/SIGTERM.
///
/// With `once` the display is updated a single time and the command exits,
/// failing if the display tool fails.
pub async fn run(
    config: &AppConfig,
    meeting_type: Option<MeetingType>,
    interval: Option<u64>,
    once: bool,
) -> ClientResult<()> {
    let meeting_type = meeting_type.unwrap_or(config.meeting_type_default);
    let mut cycle = poll_cycle(config)?;
    let display_cmd = display_command(config);

    if once {
        let outcome = cycle.run_once(meeting_type, &display_cmd).await?;
        println!("{}", outcome.text);
        return Ok(());
    }

    let mut scheduler_config = config.schedule.scheduler_config();
    if let Some(secs) = interval {
        if secs == 0 {
            return Err(ClientError::config("--interval must be positive"));
        }
        scheduler_config.interval = Duration::from_secs(secs);
    }

    let signals = SignalHandler::new();
    signals.spawn_listener()?;

    info!(
        sources = ?cycle.source_names(),
        meeting_type = %meeting_type,
        program = display_cmd.program(),
        "starting poll loop"
    );

    let cycle = Arc::new(Mutex::new(cycle));
    let display = Arc::new(display_cmd);
    Scheduler::new(scheduler_config)
        .run(
            move || {
                let cycle = cycle.clone();
                let display = display.clone();
                async move {
                    cycle
                        .lock()
                        .await
                        .run_once(meeting_type, display.as_ref())
                        .await
                        .map(|_| ())
                        .map_err(|e| e.to_string())
                }
            },
            signals.shutdown(),
        )
        .await;

    info!("poll loop stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_schedule_interval_is_rejected() {
        let config = AppConfig::parse("[schedule]\ninterval_secs = 0").unwrap();
        let err = run(&config, None, None, false).await.unwrap_err();
        assert!(matches!(err, ClientError::Config(_)), "{err}");
    }

    #[tokio::test]
    async fn zero_cli_interval_is_rejected() {
        let err = run(&AppConfig::default(), None, Some(0), false).await.unwrap_err();
        assert!(matches!(err, ClientError::Config(_)), "{err}");
    }
}
