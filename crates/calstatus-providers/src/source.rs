//! The calendar source abstraction.
//!
//! A [`CalendarSource`] turns one backend into a list of [`Event`]s for a
//! given [`EventQuery`]. Sources may fail; turning failures into a status is
//! the job of [`SourceAdapter`](crate::adapter::SourceAdapter).

use std::future::Future;
use std::pin::Pin;

use calstatus_core::{DisplayZone, Event, MeetingType, TimeWindow};
use chrono::{DateTime, Duration, Utc};

use crate::error::{ProviderError, ProviderResult};

/// How far ahead a NEXT query looks.
pub const NEXT_LOOKAHEAD_DAYS: i64 = 7;

/// A boxed future, so [`CalendarSource`] stays object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a poll is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventQuery {
    pub meeting_type: MeetingType,
    pub now: DateTime<Utc>,
    pub zone: DisplayZone,
}

impl EventQuery {
    pub fn new(meeting_type: MeetingType, now: DateTime<Utc>, zone: DisplayZone) -> Self {
        Self {
            meeting_type,
            now,
            zone,
        }
    }

    /// The time range an API should be asked about.
    ///
    /// APIs return events overlapping the window, so CURRENT uses a one
    /// minute window starting now.
    pub fn window(&self) -> TimeWindow {
        let today = self.zone.local_date(self.now);
        match self.meeting_type {
            MeetingType::Current => TimeWindow::from_duration(self.now, Duration::minutes(1)),
            MeetingType::Next => {
                TimeWindow::from_duration(self.now, Duration::days(NEXT_LOOKAHEAD_DAYS))
            }
            MeetingType::Today => TimeWindow::for_date(today, self.zone),
            MeetingType::Tomorrow => {
                TimeWindow::for_date(today.succ_opt().unwrap_or(today), self.zone)
            }
        }
    }
}

/// A backend that can list events.
pub trait CalendarSource: Send + Sync {
    /// Display name, e.g. `"ICS"` or `"OAuth"`. Used in status labels.
    fn name(&self) -> &str;

    /// Fetches the events relevant to `query`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] on transport, authentication or decoding
    /// failures.
    fn fetch_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<Event>>>;
}

/// A source that always fails with the error it was built from.
///
/// Stands in for a source whose configuration could not be turned into a
/// working backend, so the failure still shows up in every poll.
#[derive(Debug)]
pub struct ErrorSource {
    name: String,
    code: crate::error::ProviderErrorCode,
    message: String,
}

impl ErrorSource {
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            code: error.code(),
            message: error.message().to_string(),
        }
    }
}

impl CalendarSource for ErrorSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_events(&self, _query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        Box::pin(async move {
            Err(ProviderError::new(self.code, self.message.clone()).with_provider(&self.name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 15, 0).unwrap()
    }

    #[test]
    fn current_window_is_short() {
        let query = EventQuery::new(MeetingType::Current, now(), DisplayZone::UTC);
        let window = query.window();
        assert_eq!(window.start, now());
        assert_eq!(window.duration(), Duration::minutes(1));
    }

    #[test]
    fn next_window_looks_a_week_ahead() {
        let query = EventQuery::new(MeetingType::Next, now(), DisplayZone::UTC);
        assert_eq!(query.window().duration(), Duration::days(7));
    }

    #[test]
    fn day_windows_follow_zone() {
        let warsaw = DisplayZone::from_name("Europe/Warsaw").unwrap();
        let today = EventQuery::new(MeetingType::Today, now(), warsaw).window();
        assert_eq!(today.start, Utc.with_ymd_and_hms(2024, 5, 31, 22, 0, 0).unwrap());

        let tomorrow = EventQuery::new(MeetingType::Tomorrow, now(), DisplayZone::UTC).window();
        assert_eq!(tomorrow.start, Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap());
        assert_eq!(tomorrow.end, Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn error_source_always_fails() {
        let source = ErrorSource::new("OAuth", ProviderError::configuration("no token file"));
        let query = EventQuery::new(MeetingType::Current, now(), DisplayZone::UTC);
        let err = source.fetch_events(query).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
        assert_eq!(err.provider(), Some("OAuth"));
        assert_eq!(source.name(), "OAuth");
    }
}
