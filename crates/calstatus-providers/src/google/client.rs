//! Google Calendar API v3 client (read-only).

use std::time::Duration;

use calstatus_core::{Event, EventTime, TimeWindow};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};

/// Base URL for Google Calendar API v3.
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Calendar access roles that can see event details.
const READABLE_ROLES: [&str; 3] = ["owner", "writer", "reader"];

/// Thin HTTP wrapper around `calendarList.list` and `events.list`.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GoogleCalendarClient {
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::configuration("failed to create HTTP client").with_source(e))?;
        Ok(Self {
            http_client,
            base_url: CALENDAR_API_BASE.to_string(),
        })
    }

    /// Points the client at another API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        query: &[(&str, String)],
    ) -> ProviderResult<T> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    "request timeout".to_string()
                } else {
                    format!("request failed: {e}")
                };
                ProviderError::fetch(message).with_source(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_api_status(status.as_u16(), &body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::fetch("failed to read response").with_source(e))?;
        serde_json::from_str(&body)
            .map_err(|e| ProviderError::parse("failed to parse API response").with_source(e))
    }

    /// Lists calendars whose events the token can read.
    ///
    /// # Errors
    ///
    /// Returns an error for any non-success status or malformed body.
    pub async fn list_calendars(&self, token: &str) -> ProviderResult<Vec<CalendarListEntry>> {
        let url = format!("{}/users/me/calendarList", self.base_url);
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = Vec::new();
            if let Some(page) = &page_token {
                query.push(("pageToken", page.clone()));
            }
            let page: CalendarListResponse = self.get_json(&url, token, &query).await?;
            calendars.extend(page.items.into_iter().filter(CalendarListEntry::is_readable));
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(count = calendars.len(), "listed calendars");
        Ok(calendars)
    }

    /// Lists expanded event instances overlapping `window`, ordered by start.
    /// Cancelled events are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error for any non-success status or malformed body.
    pub async fn list_events(
        &self,
        token: &str,
        calendar_id: &str,
        window: TimeWindow,
    ) -> ProviderResult<Vec<Event>> {
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        );
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("timeMin", window.start.to_rfc3339()),
                ("timeMax", window.end.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ];
            if let Some(page) = &page_token {
                query.push(("pageToken", page.clone()));
            }
            let page: EventListResponse = self.get_json(&url, token, &query).await?;
            events.extend(
                page.items
                    .into_iter()
                    .filter_map(|item| convert_event(item, calendar_id)),
            );
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(calendar = calendar_id, count = events.len(), "listed events");
        Ok(events)
    }
}

fn convert_time(time: &ApiEventTime) -> Option<EventTime> {
    if let Some(dt) = &time.date_time {
        return DateTime::parse_from_rfc3339(dt)
            .map(|parsed| EventTime::DateTime(parsed.with_timezone(&Utc)))
            .map_err(|e| warn!(value = %dt, error = %e, "unparseable dateTime"))
            .ok();
    }
    time.date.as_ref().and_then(|date| {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(EventTime::AllDay)
            .map_err(|e| warn!(value = %date, error = %e, "unparseable date"))
            .ok()
    })
}

fn convert_event(event: ApiEvent, calendar_id: &str) -> Option<Event> {
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }
    let start = event.start.as_ref().and_then(convert_time);
    let end = event.end.as_ref().and_then(convert_time);
    Some(
        Event::new(event.summary.unwrap_or_default(), start, end)
            .with_location(event.location.unwrap_or_default())
            .with_description(event.description.unwrap_or_default())
            .with_calendar_id(calendar_id),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    start: Option<ApiEventTime>,
    end: Option<ApiEventTime>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
    next_page_token: Option<String>,
}

/// A calendar from the calendar list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListEntry {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub primary: bool,
    pub access_role: Option<String>,
}

impl CalendarListEntry {
    /// `freeBusyReader` calendars only expose busy blocks, not events.
    pub fn is_readable(&self) -> bool {
        self.access_role
            .as_deref()
            .is_some_and(|role| READABLE_ROLES.contains(&role))
    }
}
