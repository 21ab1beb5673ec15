//! Poll loop: scheduler, status cache, display command.
//!
//! This crate ties the sources to the display:
//! - [`PollCycle`] asks every source adapter, reconciles and formats
//! - [`StatusCache`] optionally reuses a recent decision per meeting type
//! - [`Scheduler`] repeats the cycle on a fixed, optionally aligned interval
//! - [`DisplayCommand`] hands the result to the LED display tool
//!
//! # Example
//!
//! ```rust,no_run
//! use calstatus_core::{DisplayFormatter, MeetingType, Reconciler};
//! use calstatus_server::{DisplayCommand, PollCycle};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cycle = PollCycle::new(Vec::new(), Reconciler::default(), DisplayFormatter::default());
//!     let display = DisplayCommand::new("./run_in_venv.sh");
//!     let outcome = cycle.run_once(MeetingType::Current, &display).await?;
//!     println!("{}", outcome.text);
//!     Ok(())
//! }
//! ```

mod cache;
mod display;
mod error;
mod poll;
mod scheduler;
mod signals;

pub use cache::{CacheEntry, StatusCache};
pub use display::{
    DEFAULT_TIMEOUT as DISPLAY_TIMEOUT, DisplayCommand, DisplaySink, default_asset_args,
    default_text_args,
};
pub use error::{ServerError, ServerResult};
pub use poll::{PollCycle, PollOutcome};
pub use scheduler::{
    DEFAULT_INTERVAL, MIN_INTERVAL, Scheduler, SchedulerCommand, SchedulerConfig, SchedulerHandle,
    SchedulerState, SharedSchedulerState, new_scheduler_state,
};
pub use signals::{ShutdownSignal, SignalHandler};
