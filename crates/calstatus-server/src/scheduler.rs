//! Fixed-interval scheduler for the poll loop.
//!
//! The scheduler runs one poll immediately, then one per interval. With
//! alignment enabled the ticks land on wall-clock multiples of the interval
//! (for 30 minutes: :00 and :30). Polls never overlap and there is no retry
//! or backoff; a failed poll simply waits for the next tick.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::signals::ShutdownSignal;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Shortest interval the loop will wait between polls.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between polls.
    pub interval: Duration,
    /// Snap ticks to wall-clock multiples of `interval`.
    pub align_to_interval: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            align_to_interval: true,
        }
    }
}

impl SchedulerConfig {
    /// Creates an unaligned config with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            align_to_interval: false,
        }
    }

    pub fn with_alignment(mut self, align: bool) -> Self {
        self.align_to_interval = align;
        self
    }

    /// Delay from `now` until the next poll.
    ///
    /// Aligned delays are measured against the Unix epoch, so a 30 minute
    /// interval fires at :00 and :30 of every hour. Intervals are raised to
    /// [`MIN_INTERVAL`].
    pub fn next_delay(&self, now: DateTime<Utc>) -> Duration {
        let interval = self.interval.max(MIN_INTERVAL);
        if !self.align_to_interval {
            return interval;
        }

        let secs = interval.as_secs();
        let into_slot = Duration::from_secs(now.timestamp().rem_euclid(secs as i64) as u64)
            + Duration::from_nanos(u64::from(now.timestamp_subsec_nanos()));
        let slot = Duration::from_secs(secs);
        if into_slot.is_zero() {
            slot
        } else {
            slot - into_slot
        }
    }
}

/// Commands that can be sent to a running scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Poll immediately. The next regular tick keeps its deadline.
    SyncNow,
    /// Leave the loop.
    Stop,
}

/// What the scheduler has done so far.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    /// Number of polls run, successful or not.
    pub runs: u64,
    pub consecutive_failures: u32,
    pub last_run: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl SchedulerState {
    pub fn record_success(&mut self) {
        let now = Utc::now();
        self.runs += 1;
        self.consecutive_failures = 0;
        self.last_run = Some(now);
        self.last_success = Some(now);
        self.last_error = None;
    }

    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.runs += 1;
        self.consecutive_failures += 1;
        self.last_run = Some(Utc::now());
        self.last_error = Some(error.into());
    }
}

pub type SharedSchedulerState = Arc<RwLock<SchedulerState>>;

pub fn new_scheduler_state() -> SharedSchedulerState {
    Arc::new(RwLock::new(SchedulerState::default()))
}

/// Drives a poll function on a fixed interval.
pub struct Scheduler {
    config: SchedulerConfig,
    state: SharedSchedulerState,
    command_tx: mpsc::Sender<SchedulerCommand>,
    command_rx: mpsc::Receiver<SchedulerCommand>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            state: new_scheduler_state(),
            command_tx,
            command_rx,
        }
    }

    /// Returns a handle for sending commands to the scheduler.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
            state: self.state.clone(),
        }
    }

    pub fn state(&self) -> SharedSchedulerState {
        self.state.clone()
    }

    /// Runs `sync_fn` now and then on every tick until stopped by a
    /// [`SchedulerCommand::Stop`] or by `shutdown`.
    pub async fn run<F, Fut>(self, sync_fn: F, mut shutdown: ShutdownSignal)
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<(), String>> + Send,
    {
        let Self {
            config,
            state,
            mut command_rx,
            // held so `recv` only yields None once every handle is gone too
            command_tx: _command_tx,
        } = self;

        info!(
            interval_secs = config.interval.as_secs(),
            aligned = config.align_to_interval,
            "scheduler started"
        );

        run_sync(&state, &sync_fn).await;

        let mut deadline = next_deadline(&config);
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    run_sync(&state, &sync_fn).await;
                    deadline = next_deadline(&config);
                }
                cmd = command_rx.recv() => match cmd {
                    Some(SchedulerCommand::SyncNow) => {
                        debug!("poll requested");
                        run_sync(&state, &sync_fn).await;
                    }
                    Some(SchedulerCommand::Stop) | None => {
                        info!("scheduler stopping");
                        break;
                    }
                },
                _ = shutdown.wait() => {
                    info!("shutdown requested, scheduler stopping");
                    break;
                }
            }
        }
    }
}

fn next_deadline(config: &SchedulerConfig) -> Instant {
    let delay = config.next_delay(Utc::now());
    debug!(delay_secs = delay.as_secs(), "next poll scheduled");
    Instant::now() + delay
}

async fn run_sync<F, Fut>(state: &SharedSchedulerState, sync_fn: &F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<(), String>>,
{
    match sync_fn().await {
        Ok(()) => state.write().await.record_success(),
        Err(e) => {
            warn!(error = %e, "poll failed");
            state.write().await.record_failure(e);
        }
    }
}

/// Handle for sending commands to a running scheduler.
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    state: SharedSchedulerState,
}

impl SchedulerHandle {
    pub async fn sync_now(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::SyncNow).await
    }

    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::Stop).await
    }

    pub async fn state(&self) -> SchedulerState {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::SignalHandler;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn utc(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, h, m, s).unwrap()
    }

    #[test]
    fn aligned_delay_hits_half_hours() {
        let config = SchedulerConfig::default();
        assert_eq!(config.next_delay(utc(9, 10, 0)), Duration::from_secs(20 * 60));
        assert_eq!(config.next_delay(utc(9, 59, 30)), Duration::from_secs(30));
        assert_eq!(config.next_delay(utc(9, 30, 0)), Duration::from_secs(30 * 60));
    }

    #[test]
    fn aligned_delay_accounts_for_subseconds() {
        let config = SchedulerConfig::new(Duration::from_secs(60)).with_alignment(true);
        let now = utc(9, 0, 10) + chrono::Duration::milliseconds(500);
        assert_eq!(config.next_delay(now), Duration::from_millis(49_500));
    }

    #[test]
    fn unaligned_delay_is_the_interval() {
        let config = SchedulerConfig::new(Duration::from_secs(90));
        assert_eq!(config.next_delay(utc(9, 10, 7)), Duration::from_secs(90));
    }

    #[test]
    fn zero_interval_is_raised_to_minimum() {
        let now = utc(9, 10, 7);
        assert_eq!(SchedulerConfig::new(Duration::ZERO).next_delay(now), MIN_INTERVAL);
        assert_eq!(
            SchedulerConfig::new(Duration::from_millis(200))
                .with_alignment(true)
                .next_delay(now),
            MIN_INTERVAL
        );
    }

    #[test]
    fn state_tracks_failures() {
        let mut state = SchedulerState::default();
        state.record_failure("display offline");
        state.record_failure("display offline");
        assert_eq!(state.consecutive_failures, 2);
        assert_eq!(state.last_error.as_deref(), Some("display offline"));
        assert!(state.last_success.is_none());

        state.record_success();
        assert_eq!(state.runs, 3);
        assert_eq!(state.consecutive_failures, 0);
        assert!(state.last_error.is_none());
    }

    fn counting(count: Arc<AtomicU32>) -> impl Fn() -> std::future::Ready<Result<(), String>> {
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_every_tick() {
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_secs(60)));
        let handle = scheduler.handle();
        let count = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(scheduler.run(counting(count.clone()), ShutdownSignal::never()));

        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        handle.stop().await.unwrap();
        task.await.unwrap();
        assert_eq!(handle.state().await.runs, 3);
    }

    #[tokio::test]
    async fn sync_now_and_stop() {
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_secs(3600)));
        let handle = scheduler.handle();
        let count = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(scheduler.run(counting(count.clone()), ShutdownSignal::never()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        handle.sync_now().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        handle.stop().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn sync_now_keeps_tick_deadline() {
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_secs(60)));
        let handle = scheduler.handle();
        let count = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(scheduler.run(counting(count.clone()), ShutdownSignal::never()));

        tokio::time::sleep(Duration::from_secs(30)).await;
        handle.sync_now().await.unwrap();
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        handle.stop().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_stop_the_loop() {
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_secs(10)));
        let state = scheduler.state();
        let handle = scheduler.handle();

        let task = tokio::spawn(scheduler.run(
            || std::future::ready(Err("device unreachable".to_string())),
            ShutdownSignal::never(),
        ));

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(state.read().await.consecutive_failures, 3);

        handle.stop().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_does_not_spin() {
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::ZERO));
        let handle = scheduler.handle();
        let count = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(scheduler.run(counting(count.clone()), ShutdownSignal::never()));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        handle.stop().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_signal_ends_loop() {
        let signals = SignalHandler::new();
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_secs(3600)));
        let count = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(scheduler.run(counting(count.clone()), signals.shutdown()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        signals.trigger_shutdown();

        let finished = tokio::time::timeout(Duration::from_secs(1), task).await;
        assert!(finished.is_ok());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
