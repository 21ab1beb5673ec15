//! Short-lived cache of reconciled statuses.
//!
//! Entries are keyed by [`MeetingType`] and expire after a fixed TTL. The
//! cache is owned by the single poller, so there is no locking. A zero TTL
//! disables caching.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use calstatus_core::{AggregateStatus, MeetingType, SourceResult};
use chrono::{DateTime, Utc};
use tracing::trace;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub results: Vec<SourceResult>,
    pub status: AggregateStatus,
    pub updated_at: DateTime<Utc>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(results: Vec<SourceResult>, status: AggregateStatus, ttl: Duration) -> Self {
        Self {
            results,
            status,
            updated_at: Utc::now(),
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

#[derive(Debug, Default)]
pub struct StatusCache {
    ttl: Duration,
    entries: HashMap<MeetingType, CacheEntry>,
}

impl StatusCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Returns the entry for `meeting_type` if it has not expired.
    pub fn get(&self, meeting_type: MeetingType) -> Option<&CacheEntry> {
        let entry = self.entries.get(&meeting_type)?;
        if entry.is_expired() {
            trace!(%meeting_type, "cache entry expired");
            return None;
        }
        trace!(%meeting_type, remaining_secs = entry.time_until_expiry().as_secs(), "cache hit");
        Some(entry)
    }

    /// Stores a result, replacing any previous entry and dropping expired
    /// ones. No-op when disabled.
    pub fn insert(
        &mut self,
        meeting_type: MeetingType,
        results: Vec<SourceResult>,
        status: AggregateStatus,
    ) {
        if !self.is_enabled() {
            return;
        }
        self.prune_expired();
        self.entries
            .insert(meeting_type, CacheEntry::new(results, status, self.ttl));
    }

    fn prune_expired(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let pruned = before - self.entries.len();
        if pruned > 0 {
            trace!(pruned, "expired cache entries dropped");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calstatus_core::StatusKind;

    fn busy() -> (Vec<SourceResult>, AggregateStatus) {
        (
            vec![SourceResult::busy("ICS", "Standup @ 09:00")],
            AggregateStatus::new(StatusKind::Busy, "Standup @ 09:00"),
        )
    }

    #[test]
    fn zero_ttl_disables_cache() {
        let mut cache = StatusCache::new(Duration::ZERO);
        let (results, status) = busy();
        cache.insert(MeetingType::Current, results, status);
        assert!(!cache.is_enabled());
        assert!(cache.is_empty());
        assert!(cache.get(MeetingType::Current).is_none());
    }

    #[test]
    fn hit_within_ttl() {
        let mut cache = StatusCache::new(Duration::from_secs(60));
        let (results, status) = busy();
        cache.insert(MeetingType::Current, results, status.clone());
        let entry = cache.get(MeetingType::Current).unwrap();
        assert_eq!(entry.status, status);
        assert_eq!(entry.results.len(), 1);
        assert!(cache.get(MeetingType::Next).is_none());
    }

    #[test]
    fn entries_expire() {
        let mut cache = StatusCache::new(Duration::from_millis(20));
        let (results, status) = busy();
        cache.insert(MeetingType::Today, results, status);
        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get(MeetingType::Today).is_none());
        assert_eq!(cache.len(), 1);

        let (results, status) = busy();
        cache.insert(MeetingType::Current, results, status);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(MeetingType::Current).is_some());
    }

    #[test]
    fn last_writer_wins() {
        let mut cache = StatusCache::new(Duration::from_secs(60));
        let (results, status) = busy();
        cache.insert(MeetingType::Current, results, status);
        cache.insert(
            MeetingType::Current,
            vec![],
            AggregateStatus::new(StatusKind::Free, "Free"),
        );
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(MeetingType::Current).unwrap().status.label, "Free");
    }
}
