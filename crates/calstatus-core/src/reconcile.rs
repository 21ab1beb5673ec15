//! Merging per-source results into one busy/free decision.
//!
//! The policy, applied to results in priority order:
//!
//! 1. any BUSY: BUSY with the first busy label
//! 2. every result FREE: FREE / "Free"
//! 3. otherwise FREE, naming the sources that failed
//!
//! An empty input is reported as ERROR.

use tracing::debug;

use crate::status::{AggregateStatus, SourceResult, StatusKind};

pub const FREE_LABEL: &str = "Free";
pub const NO_SOURCES_LABEL: &str = "No calendar sources configured";

/// Reconciles results that are already in priority order.
pub fn reconcile(results: &[SourceResult]) -> AggregateStatus {
    if results.is_empty() {
        return AggregateStatus::new(StatusKind::Error, NO_SOURCES_LABEL);
    }

    if let Some(busy) = results.iter().find(|r| r.status() == StatusKind::Busy) {
        debug!(source = %busy.source_name, label = %busy.label(), "busy");
        return AggregateStatus::new(StatusKind::Busy, busy.label());
    }

    let failed: Vec<&str> = results
        .iter()
        .filter(|r| r.status() == StatusKind::Error)
        .map(|r| r.source_name.as_str())
        .collect();

    if failed.is_empty() {
        AggregateStatus::new(StatusKind::Free, FREE_LABEL)
    } else {
        debug!(failed = ?failed, "free with unavailable sources");
        AggregateStatus::new(
            StatusKind::Free,
            format!("Free (some calendars unavailable: {})", failed.join(", ")),
        )
    }
}

/// Applies a configured source priority before reconciling.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    priority: Vec<String>,
}

impl Reconciler {
    /// Creates a reconciler. Names match source names case-insensitively.
    pub fn new<I, S>(priority: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            priority: priority.into_iter().map(Into::into).collect(),
        }
    }

    fn rank(&self, source_name: &str) -> usize {
        self.priority
            .iter()
            .position(|p| p.eq_ignore_ascii_case(source_name))
            .unwrap_or(self.priority.len())
    }

    /// Sorts results by priority. The sort is stable, so unlisted sources keep
    /// their relative order after the listed ones.
    pub fn order(&self, mut results: Vec<SourceResult>) -> Vec<SourceResult> {
        results.sort_by_key(|r| self.rank(&r.source_name));
        results
    }

    pub fn reconcile(&self, results: Vec<SourceResult>) -> AggregateStatus {
        reconcile(&self.order(results))
    }
}
