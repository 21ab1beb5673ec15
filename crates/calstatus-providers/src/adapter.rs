//! Source adapters: one calendar backend in, one [`SourceResult`] out.

use std::sync::Arc;

use calstatus_core::{DisplayZone, MeetingType, SourceResult};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::select::select_status;
use crate::source::{CalendarSource, EventQuery};

/// Wraps a [`CalendarSource`] so that fetching never fails: errors become an
/// error result labelled with the error code.
#[derive(Clone)]
pub struct SourceAdapter {
    source: Arc<dyn CalendarSource>,
    zone: DisplayZone,
}

impl std::fmt::Debug for SourceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceAdapter")
            .field("source", &self.source.name())
            .field("zone", &self.zone)
            .finish()
    }
}

impl SourceAdapter {
    pub fn new(source: Arc<dyn CalendarSource>, zone: DisplayZone) -> Self {
        Self { source, zone }
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// Fetches and evaluates `meeting_type` as of now.
    pub async fn fetch_status(&self, meeting_type: MeetingType) -> SourceResult {
        self.fetch_status_at(meeting_type, Utc::now()).await
    }

    /// Fetches and evaluates `meeting_type` as of `now`.
    pub async fn fetch_status_at(
        &self,
        meeting_type: MeetingType,
        now: DateTime<Utc>,
    ) -> SourceResult {
        let query = EventQuery::new(meeting_type, now, self.zone);
        match self.source.fetch_events(query).await {
            Ok(events) => {
                let status = select_status(&events, &query);
                debug!(
                    source = self.name(),
                    meeting_type = %meeting_type,
                    events = events.len(),
                    status = %status.kind(),
                    "source evaluated"
                );
                SourceResult::new(self.name(), status)
            }
            Err(e) => {
                warn!(source = self.name(), error = %e, "source unavailable");
                SourceResult::error(self.name(), e.code().as_str())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::error::{ProviderError, ProviderResult};
    use crate::source::BoxFuture;
    use calstatus_core::Event;
    use std::sync::Mutex;

    /// Returns canned events or errors and records the queries it saw.
    #[derive(Debug)]
    pub struct FakeSource {
        pub name: String,
        pub result: Mutex<Option<ProviderResult<Vec<Event>>>>,
        pub queries: Mutex<Vec<EventQuery>>,
    }

    impl FakeSource {
        pub fn events(name: &str, events: Vec<Event>) -> Self {
            Self {
                name: name.to_string(),
                result: Mutex::new(Some(Ok(events))),
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(name: &str, error: ProviderError) -> Self {
            Self {
                name: name.to_string(),
                result: Mutex::new(Some(Err(error))),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    impl CalendarSource for FakeSource {
        fn name(&self) -> &str {
            &self.name
        }

        fn fetch_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
            self.queries.lock().unwrap().push(query);
            let result = match self.result.lock().unwrap().as_ref() {
                Some(Ok(events)) => Ok(events.clone()),
                Some(Err(e)) => Err(ProviderError::new(e.code(), e.message())),
                None => Ok(Vec::new()),
            };
            Box::pin(async move { result })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeSource;
    use super::*;
    use crate::error::ProviderError;
    use calstatus_core::{Event, SourceStatus, StatusKind};
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn busy_when_meeting_is_on() {
        let source = Arc::new(FakeSource::events(
            "ICS",
            vec![Event::timed("Standup", at(9, 0), at(9, 30))],
        ));
        let adapter = SourceAdapter::new(source.clone(), DisplayZone::UTC);
        let result = adapter.fetch_status_at(MeetingType::Current, at(9, 15)).await;
        assert_eq!(result, SourceResult::busy("ICS", "Standup @ 09:00"));

        let queries = source.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].meeting_type, MeetingType::Current);
        assert_eq!(queries[0].now, at(9, 15));
    }

    #[tokio::test]
    async fn errors_become_error_results() {
        let source = Arc::new(FakeSource::failing(
            "OAuth",
            ProviderError::authentication("token expired"),
        ));
        let adapter = SourceAdapter::new(source, DisplayZone::UTC);
        let result = adapter.fetch_status_at(MeetingType::Next, at(9, 0)).await;
        assert_eq!(result.status(), StatusKind::Error);
        assert_eq!(
            result.status,
            SourceStatus::Error("authentication_failed".to_string())
        );
        assert_eq!(result.source_name, "OAuth");
    }

    #[tokio::test]
    async fn empty_source_is_free() {
        let adapter = SourceAdapter::new(Arc::new(FakeSource::events("Service", vec![])), DisplayZone::UTC);
        let result = adapter.fetch_status_at(MeetingType::Today, at(9, 0)).await;
        assert_eq!(result, SourceResult::free("Service", "No events today"));
    }
}
