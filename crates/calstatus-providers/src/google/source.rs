use std::sync::Arc;

use calstatus_core::Event;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::google::client::GoogleCalendarClient;
use crate::google::credentials::CredentialProvider;
use crate::source::{BoxFuture, CalendarSource, EventQuery};

/// Google Calendar behind a credential provider. The same type backs both
/// the OAuth and the service-account adapters; only the credentials differ.
#[derive(Debug, Clone)]
pub struct GoogleSource {
    name: String,
    client: GoogleCalendarClient,
    credentials: Arc<dyn CredentialProvider>,
    calendar_ids: Vec<String>,
}

impl GoogleSource {
    pub fn new(
        name: impl Into<String>,
        client: GoogleCalendarClient,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            client,
            credentials,
            calendar_ids: Vec::new(),
        }
    }

    /// Restricts the source to these calendars instead of every readable
    /// one.
    #[must_use]
    pub fn with_calendar_ids(mut self, ids: Vec<String>) -> Self {
        self.calendar_ids = ids;
        self
    }

    async fn calendars(&self, token: &str) -> ProviderResult<Vec<String>> {
        if !self.calendar_ids.is_empty() {
            return Ok(self.calendar_ids.clone());
        }
        let calendars = self.client.list_calendars(token).await?;
        Ok(calendars.into_iter().map(|c| c.id).collect())
    }

    async fn fetch(&self, query: EventQuery) -> ProviderResult<Vec<Event>> {
        let token = self.credentials.access_token().await?;
        let calendars = self.calendars(&token).await?;
        let window = query.window();

        let mut events = Vec::new();
        let mut first_error: Option<ProviderError> = None;
        let mut succeeded = 0usize;

        for calendar_id in &calendars {
            match self.client.list_events(&token, calendar_id, window).await {
                Ok(found) => {
                    succeeded += 1;
                    events.extend(found);
                }
                Err(e) => {
                    warn!(source = %self.name, calendar = %calendar_id, error = %e, "skipping calendar");
                    first_error.get_or_insert(e);
                }
            }
        }

        if succeeded == 0
            && let Some(e) = first_error
        {
            return Err(e);
        }
        debug!(
            source = %self.name,
            calendars = calendars.len(),
            count = events.len(),
            "Google events"
        );
        Ok(events)
    }
}

impl CalendarSource for GoogleSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        Box::pin(async move { self.fetch(query).await.map_err(|e| e.with_provider(&self.name)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::error::ProviderErrorCode;
    use crate::google::credentials::StaticToken;
    use crate::test_support::{Route, serve_routes};
    use calstatus_core::{DisplayZone, MeetingType};
    use chrono::{TimeZone, Utc};

    fn query() -> EventQuery {
        EventQuery::new(
            MeetingType::Today,
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
            DisplayZone::UTC,
        )
    }

    fn source(base: &str) -> GoogleSource {
        let client = GoogleCalendarClient::new(Duration::from_secs(5))
            .unwrap()
            .with_base_url(base);
        GoogleSource::new("OAuth", client, Arc::new(StaticToken::new("tok")))
    }

    const ONE_EVENT: &str = r#"{"items": [{"summary": "Sync",
        "start": {"dateTime": "2024-06-01T09:00:00Z"}, "end": {"dateTime": "2024-06-01T09:30:00Z"}}]}"#;

    #[tokio::test]
    async fn unions_readable_calendars() {
        let (base, _) = serve_routes(vec![
            Route::new(
                "/users/me/calendarList",
                "200 OK",
                r#"{"items": [{"id": "a", "accessRole": "owner"}, {"id": "b", "accessRole": "reader"}]}"#,
            ),
            Route::new("/calendars/a/events", "200 OK", ONE_EVENT),
            Route::new("/calendars/b/events", "200 OK", ONE_EVENT),
        ])
        .await;
        let events = source(&base).fetch_events(query()).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].source_calendar_id.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn failing_calendar_is_skipped() {
        let (base, _) = serve_routes(vec![
            Route::new("/calendars/good/events", "200 OK", ONE_EVENT),
            Route::new("/calendars/bad/events", "403 Forbidden", "{}"),
        ])
        .await;
        let events = source(&base)
            .with_calendar_ids(vec!["bad".into(), "good".into()])
            .fetch_events(query())
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn all_calendars_failing_reports_first_error() {
        let (base, _) = serve_routes(vec![
            Route::new("/calendars/one/events", "403 Forbidden", "{}"),
            Route::new("/calendars/two/events", "500 Internal Server Error", "{}"),
        ])
        .await;
        let err = source(&base)
            .with_calendar_ids(vec!["one".into(), "two".into()])
            .fetch_events(query())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthorizationFailed);
        assert_eq!(err.provider(), Some("OAuth"));
    }

    #[tokio::test]
    async fn explicit_ids_skip_calendar_list() {
        let (base, mut requests) =
            serve_routes(vec![Route::new("/calendars/primary/events", "200 OK", ONE_EVENT)]).await;
        source(&base)
            .with_calendar_ids(vec!["primary".into()])
            .fetch_events(query())
            .await
            .unwrap();
        let first = requests.recv().await.unwrap();
        assert!(first.starts_with("GET /calendars/primary/events"));
    }

    #[tokio::test]
    async fn credential_failure_stops_early() {
        let client = GoogleCalendarClient::new(Duration::from_secs(5)).unwrap();
        let source = GoogleSource::new("Service", client, Arc::new(StaticToken::new("")));
        let err = source.fetch_events(query()).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
    }
}
