//! Lists what each source sees for a meeting type.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use calstatus_core::{DisplayFormatter, DisplayZone, Event, MeetingType, TimeWindow};
use calstatus_providers::{EventQuery, ProviderResult};

use crate::commands::formatter;
use crate::config::AppConfig;
use crate::error::ClientResult;
use crate::sources::build_sources;

pub async fn run(config: &AppConfig, meeting_type: Option<MeetingType>) -> ClientResult<()> {
    config.validate()?;
    let meeting_type = meeting_type.unwrap_or(config.meeting_type_default);
    let zone = config.zone()?;
    let formatter = formatter(config)?;
    let query = EventQuery::new(meeting_type, Utc::now(), zone);

    let sources = build_sources(config);
    if sources.is_empty() {
        println!("No calendar sources configured");
        return Ok(());
    }
    for source in sources {
        let result = source.fetch_events(query).await;
        print!("{}", render(source.name(), &result, &query, &formatter));
    }
    Ok(())
}

/// Events overlapping the query window, earliest first.
pub fn in_window<'a>(events: &'a [Event], window: TimeWindow, zone: DisplayZone) -> Vec<&'a Event> {
    let mut found: Vec<(DateTime<Utc>, &Event)> = events
        .iter()
        .filter_map(|event| {
            let start = event.start_instant(zone)?;
            let end = event.end.as_ref().map_or(start, |end| end.instant(zone));
            (start < window.end && end >= window.start).then_some((start, event))
        })
        .collect();
    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, event)| event).collect()
}

pub fn render(
    name: &str,
    result: &ProviderResult<Vec<Event>>,
    query: &EventQuery,
    formatter: &DisplayFormatter,
) -> String {
    match result {
        Err(e) => format!("{}: unavailable ({})\n", name, e.code().as_str()),
        Ok(events) => {
            let found = in_window(events, query.window(), query.zone);
            let mut out = format!("{} ({} events)\n", name, found.len());
            for event in found {
                let _ = writeln!(out, "  {}", formatter.format_event(event));
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calstatus_providers::ProviderError;
    use chrono::{NaiveDate, TimeZone};

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, h, m, 0).unwrap()
    }

    fn query(meeting_type: MeetingType) -> EventQuery {
        EventQuery::new(meeting_type, at(1, 8, 0), DisplayZone::UTC)
    }

    fn feed() -> Vec<Event> {
        vec![
            Event::timed("Retro", at(1, 15, 0), at(1, 16, 0)),
            Event::timed("Early", at(1, 0, 0), at(1, 0, 30)).with_location("Old"),
            Event::timed("Standup", at(1, 9, 0), at(1, 9, 15)).with_location("Room 1"),
            Event::all_day("Offsite", NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()),
            Event::new("Undated", None, None),
        ]
    }

    #[test]
    fn today_window_sorted() {
        let q = query(MeetingType::Today);
        let out = render("ICS", &Ok(feed()), &q, &DisplayFormatter::new(30, DisplayZone::UTC));
        insta::assert_snapshot!(out, @r"
        ICS (3 events)
          Early @ 00:00 (Old)
          Standup @ 09:00 (Room 1)
          Retro @ 15:00
        ");
    }

    #[test]
    fn tomorrow_includes_all_day() {
        let q = query(MeetingType::Tomorrow);
        let events = feed();
        let found = in_window(&events, q.window(), q.zone);
        let names: Vec<_> = found.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(names, ["Offsite"]);
    }

    #[test]
    fn unavailable_source() {
        let q = query(MeetingType::Current);
        let result = Err(ProviderError::authentication("expired"));
        assert_eq!(
            render("OAuth", &result, &q, &DisplayFormatter::default()),
            "OAuth: unavailable (authentication_failed)\n"
        );
    }
}
