//! One-shot status command.

use std::fmt::Write as _;

use calstatus_core::MeetingType;
use calstatus_server::PollOutcome;

use crate::commands::{display_command, poll_cycle};
use crate::config::AppConfig;
use crate::error::ClientResult;

/// Polls every source once and prints the result, optionally updating the
/// display as well.
pub async fn run(
    config: &AppConfig,
    meeting_type: Option<MeetingType>,
    display: bool,
    json: bool,
) -> ClientResult<()> {
    let meeting_type = meeting_type.unwrap_or(config.meeting_type_default);
    let mut cycle = poll_cycle(config)?;

    let outcome = if display {
        cycle.run_once(meeting_type, &display_command(config)).await?
    } else {
        cycle.evaluate(meeting_type).await
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render(&outcome));
    }
    Ok(())
}

/// Human-readable rendering: the display text, then one line per source.
pub fn render(outcome: &PollOutcome) -> String {
    let mut out = format!("{}\n", outcome.text);
    for result in &outcome.results {
        let _ = writeln!(
            out,
            "  {:<8} {:<6} {}",
            result.source_name,
            result.status().as_str(),
            result.label()
        );
    }
    out
}
