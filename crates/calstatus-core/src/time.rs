//! Time types for calendar events.
//!
//! This module provides [`EventTime`] for event start/end values (either a
//! concrete instant or an all-day date), [`DisplayZone`] for the timezone used
//! to render times and compute day boundaries, and [`TimeWindow`] for API
//! query ranges.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The start or end of a calendar event.
///
/// - **DateTime**: a specific instant, stored in UTC
/// - **AllDay**: a date without a time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A specific instant, stored in UTC.
    DateTime(DateTime<Utc>),
    /// An all-day date.
    AllDay(NaiveDate),
}

impl EventTime {
    /// Creates an `EventTime::DateTime` from a UTC instant.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }

    /// Creates an `EventTime::AllDay` from a date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::AllDay(date)
    }

    /// Returns `true` if this is an all-day date.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Returns the instant if this is a `DateTime`.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            Self::AllDay(_) => None,
        }
    }

    /// Returns the calendar date of this time as seen in `zone`.
    pub fn local_date(&self, zone: DisplayZone) -> NaiveDate {
        match self {
            Self::DateTime(dt) => zone.local_date(*dt),
            Self::AllDay(date) => *date,
        }
    }

    /// Returns a comparable instant.
    ///
    /// All-day dates map to local midnight in `zone`.
    pub fn instant(&self, zone: DisplayZone) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => *dt,
            Self::AllDay(date) => zone.start_of_day(*date),
        }
    }
}

/// Error returned when a timezone name is not a known IANA identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown timezone: {0}")]
pub struct UnknownZone(pub String);

/// The timezone used for local rendering and day boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayZone {
    /// The system local timezone.
    #[default]
    Local,
    /// A named IANA timezone.
    Named(Tz),
}

impl DisplayZone {
    /// UTC, mostly useful in tests.
    pub const UTC: Self = Self::Named(Tz::UTC);

    /// Looks up an IANA timezone by name.
    pub fn from_name(name: &str) -> Result<Self, UnknownZone> {
        name.parse::<Tz>()
            .map(Self::Named)
            .map_err(|_| UnknownZone(name.to_string()))
    }

    /// Returns the local date of an instant.
    pub fn local_date(&self, dt: DateTime<Utc>) -> NaiveDate {
        self.local_naive(dt).date()
    }

    /// Returns the local time of day of an instant.
    pub fn local_time(&self, dt: DateTime<Utc>) -> NaiveTime {
        self.local_naive(dt).time()
    }

    /// Returns the local wall-clock value of an instant.
    pub fn local_naive(&self, dt: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Self::Local => dt.with_timezone(&Local).naive_local(),
            Self::Named(tz) => dt.with_timezone(tz).naive_local(),
        }
    }

    /// Resolves a wall-clock value in this zone to a UTC instant.
    ///
    /// Ambiguous values (DST fall-back) resolve to the earlier instant;
    /// values inside a DST gap are shifted forward by one hour.
    pub fn resolve(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        match self {
            Self::Local => resolve_in(&Local, naive),
            Self::Named(tz) => resolve_in(tz, naive),
        }
    }

    /// Returns local midnight of `date` as a UTC instant.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.resolve(date.and_time(NaiveTime::MIN))
    }
}

fn resolve_in<Z: TimeZone>(tz: &Z, naive: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

impl FromStr for DisplayZone {
    type Err = UnknownZone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("local") {
            Ok(Self::Local)
        } else {
            Self::from_name(s)
        }
    }
}

impl fmt::Display for DisplayZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Named(tz) => f.write_str(tz.name()),
        }
    }
}

/// A half-open query range `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window. `end` is clamped so it never precedes `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Creates a window starting at `start` and lasting `duration`.
    pub fn from_duration(start: DateTime<Utc>, duration: Duration) -> Self {
        Self::new(start, start + duration)
    }

    /// Creates the window covering one local day in `zone`.
    pub fn for_date(date: NaiveDate, zone: DisplayZone) -> Self {
        let next = date.succ_opt().unwrap_or(date);
        Self::new(zone.start_of_day(date), zone.start_of_day(next))
    }

    /// Returns the duration of this window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if an instant falls within `[start, end)`.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }
}
