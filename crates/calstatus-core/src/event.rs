//! The calendar event model shared by every source.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::time::{DisplayZone, EventTime};

/// Summary used when a source provides none.
pub const DEFAULT_SUMMARY: &str = "No Title";

/// A calendar event as produced by the ICS parser or the Google mapping.
///
/// Missing text fields are resolved to defaults at construction time, so
/// consumers never deal with absent summaries or locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event title. Never empty; defaults to [`DEFAULT_SUMMARY`].
    pub summary: String,
    /// Start time. `None` when the source value could not be parsed.
    pub start: Option<EventTime>,
    /// End time. `None` when absent or unparseable.
    pub end: Option<EventTime>,
    /// Location, empty when absent.
    #[serde(default)]
    pub location: String,
    /// Description, empty when absent.
    #[serde(default)]
    pub description: String,
    /// Calendar the event came from, for API-backed sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_calendar_id: Option<String>,
}

impl Event {
    /// Creates an event. An empty summary becomes [`DEFAULT_SUMMARY`].
    pub fn new(summary: impl Into<String>, start: Option<EventTime>, end: Option<EventTime>) -> Self {
        let summary = summary.into();
        let summary = if summary.trim().is_empty() {
            DEFAULT_SUMMARY.to_string()
        } else {
            summary
        };
        Self {
            summary,
            start,
            end,
            location: String::new(),
            description: String::new(),
            source_calendar_id: None,
        }
    }

    /// Creates a timed event between two instants.
    pub fn timed(summary: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::new(
            summary,
            Some(EventTime::DateTime(start)),
            Some(EventTime::DateTime(end)),
        )
    }

    /// Creates an all-day event on a single date with no end.
    pub fn all_day(summary: impl Into<String>, date: NaiveDate) -> Self {
        Self::new(summary, Some(EventTime::AllDay(date)), None)
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_calendar_id(mut self, id: impl Into<String>) -> Self {
        self.source_calendar_id = Some(id.into());
        self
    }

    /// Returns `true` if the start carries only a date.
    pub fn is_all_day(&self) -> bool {
        self.start.is_some_and(|s| s.is_all_day())
    }

    /// Returns `true` if both bounds are instants and `start <= now <= end`.
    ///
    /// All-day events and events without an end are never current.
    pub fn is_current_at(&self, now: DateTime<Utc>) -> bool {
        match (
            self.start.and_then(|s| s.as_datetime()),
            self.end.and_then(|e| e.as_datetime()),
        ) {
            (Some(start), Some(end)) => start <= now && now <= end,
            _ => false,
        }
    }

    /// Returns the local start date in `zone`, if the event has a start.
    pub fn start_date(&self, zone: DisplayZone) -> Option<NaiveDate> {
        self.start.map(|s| s.local_date(zone))
    }

    /// Returns the start as a comparable instant, all-day dates at local
    /// midnight.
    pub fn start_instant(&self, zone: DisplayZone) -> Option<DateTime<Utc>> {
        self.start.map(|s| s.instant(zone))
    }
}
