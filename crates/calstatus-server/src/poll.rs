//! One poll cycle: ask every source, reconcile, format, display.

use calstatus_core::{
    AggregateStatus, AssetSet, DisplayFormatter, DisplayMode, DisplayPayload, MeetingType,
    Reconciler, SourceResult,
};
use calstatus_providers::SourceAdapter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::cache::StatusCache;
use crate::display::DisplaySink;
use crate::error::ServerResult;

/// Everything one cycle decided.
#[derive(Debug, Clone, Serialize)]
pub struct PollOutcome {
    pub meeting_type: MeetingType,
    pub results: Vec<SourceResult>,
    pub status: AggregateStatus,
    /// The formatted, length-bounded label.
    pub text: String,
    /// True when the status came from the cache.
    pub cached: bool,
    #[serde(skip)]
    pub payload: DisplayPayload,
}

/// The poller's state between cycles.
///
/// Sources are asked one after another; the cycle owns its cache, so callers
/// that share a cycle across tasks wrap it in a mutex.
#[derive(Debug)]
pub struct PollCycle {
    adapters: Vec<SourceAdapter>,
    reconciler: Reconciler,
    formatter: DisplayFormatter,
    mode: DisplayMode,
    assets: AssetSet,
    cache: StatusCache,
}

impl PollCycle {
    pub fn new(
        adapters: Vec<SourceAdapter>,
        reconciler: Reconciler,
        formatter: DisplayFormatter,
    ) -> Self {
        Self {
            adapters,
            reconciler,
            formatter,
            mode: DisplayMode::default(),
            assets: AssetSet::default(),
            cache: StatusCache::default(),
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_assets(mut self, assets: AssetSet) -> Self {
        self.assets = assets;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: StatusCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.adapters.iter().map(SourceAdapter::name).collect()
    }

    /// Asks every source in turn. Never fails: unavailable sources show up as
    /// error results.
    pub async fn gather(&self, meeting_type: MeetingType, now: DateTime<Utc>) -> Vec<SourceResult> {
        let mut results = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            results.push(adapter.fetch_status_at(meeting_type, now).await);
        }
        self.reconciler.order(results)
    }

    /// Decides the status as of now.
    pub async fn evaluate(&mut self, meeting_type: MeetingType) -> PollOutcome {
        self.evaluate_at(meeting_type, Utc::now()).await
    }

    /// Decides the status as of `now`, using the cache when it is fresh.
    #[instrument(skip(self), fields(meeting_type = %meeting_type))]
    pub async fn evaluate_at(&mut self, meeting_type: MeetingType, now: DateTime<Utc>) -> PollOutcome {
        if let Some(entry) = self.cache.get(meeting_type) {
            debug!("using cached status");
            let (results, status) = (entry.results.clone(), entry.status.clone());
            return self.outcome(meeting_type, results, status, true);
        }

        let results = self.gather(meeting_type, now).await;
        let status = self.reconciler.reconcile(results.clone());
        self.cache.insert(meeting_type, results.clone(), status.clone());
        self.outcome(meeting_type, results, status, false)
    }

    fn outcome(
        &self,
        meeting_type: MeetingType,
        results: Vec<SourceResult>,
        status: AggregateStatus,
        cached: bool,
    ) -> PollOutcome {
        PollOutcome {
            meeting_type,
            text: self.formatter.format_aggregate(&status),
            payload: self.formatter.payload(&status, self.mode, &self.assets),
            results,
            status,
            cached,
        }
    }

    /// Runs a full cycle and pushes the result to `sink`.
    ///
    /// # Errors
    ///
    /// Only display failures are returned; calendar failures are already
    /// folded into the outcome.
    pub async fn run_once(
        &mut self,
        meeting_type: MeetingType,
        sink: &dyn DisplaySink,
    ) -> ServerResult<PollOutcome> {
        let outcome = self.evaluate(meeting_type).await;
        sink.show(&outcome.payload).await?;
        info!(
            meeting_type = %meeting_type,
            status = %outcome.status.status,
            text = %outcome.payload.summary(),
            "display updated"
        );
        Ok(outcome)
    }
}
