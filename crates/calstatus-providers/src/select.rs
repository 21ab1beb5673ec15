//! Turning a list of events into a busy/free answer for one meeting type.

use calstatus_core::format::{day_listing, event_label, item_label};
use calstatus_core::{Event, MeetingType, SourceStatus};

use crate::source::EventQuery;

/// Applies the selection rule for `query.meeting_type` to `events`.
///
/// - current: the earliest-starting event covering now
/// - next: the earliest event starting at or after now
/// - today / tomorrow: every event starting on that local day
///
/// Ties keep input order.
pub fn select_status(events: &[Event], query: &EventQuery) -> SourceStatus {
    match query.meeting_type {
        MeetingType::Current => select_current(events, query),
        MeetingType::Next => select_next(events, query),
        MeetingType::Today => select_day(events, query, 0),
        MeetingType::Tomorrow => select_day(events, query, 1),
    }
}

fn select_current(events: &[Event], query: &EventQuery) -> SourceStatus {
    events
        .iter()
        .filter(|e| e.is_current_at(query.now))
        .min_by_key(|e| e.start_instant(query.zone))
        .map_or_else(
            || SourceStatus::Free("Free".to_string()),
            |e| SourceStatus::Busy(event_label(e, query.zone)),
        )
}

fn select_next(events: &[Event], query: &EventQuery) -> SourceStatus {
    events
        .iter()
        .filter_map(|e| e.start_instant(query.zone).map(|start| (start, e)))
        .filter(|(start, _)| *start >= query.now)
        .min_by_key(|(start, _)| *start)
        .map_or_else(
            || SourceStatus::Free("No meetings".to_string()),
            |(_, e)| SourceStatus::Busy(event_label(e, query.zone)),
        )
}

fn select_day(events: &[Event], query: &EventQuery, offset: u64) -> SourceStatus {
    let (day, empty) = if offset == 0 {
        ("Today", "No events today")
    } else {
        ("Tomorrow", "No events tomorrow")
    };
    let today = query.zone.local_date(query.now);
    let Some(target) = today.checked_add_days(chrono::Days::new(offset)) else {
        return SourceStatus::Free(empty.to_string());
    };

    let mut matching: Vec<&Event> = events
        .iter()
        .filter(|e| e.start_date(query.zone) == Some(target))
        .collect();
    // stable, so equal starts keep input order
    matching.sort_by_key(|e| e.start_instant(query.zone));

    if matching.is_empty() {
        return SourceStatus::Free(empty.to_string());
    }
    let items: Vec<String> = matching.iter().map(|e| item_label(e, query.zone)).collect();
    SourceStatus::Busy(day_listing(day, &items))
}
