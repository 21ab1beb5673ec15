//! A small iCalendar (RFC 5545) reader.
//!
//! Only `VEVENT` blocks are looked at, and only the properties needed for a
//! busy/free decision. Recurrence rules are not expanded; feeds are expected
//! to carry concrete instances.
//!
//! Malformed input never fails: a block without a usable `DTSTART` still
//! yields an event, just one without a start.

use std::sync::LazyLock;

use calstatus_core::{DisplayZone, Event, EventTime};
use chrono::{NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use regex::Regex;
use tracing::{debug, trace};

static VEVENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)BEGIN:VEVENT(.*?)END:VEVENT").expect("Invalid VEVENT regex")
});

/// Continuation lines start with a single space or tab.
static FOLD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n[ \t]").expect("Invalid fold regex"));

/// `NAME[;PARAM=VALUE...]:VALUE`. Quoted parameter values may contain `:`
/// and `;`.
static PROPERTY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^([A-Za-z0-9-]+)((?:;(?:"[^"]*"|[^:;"])*)*):(.*)$"#)
        .expect("Invalid property regex")
});

/// One `;NAME=VALUE` parameter, the value possibly quoted.
static PARAM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#";([A-Za-z0-9-]+)=("[^"]*"|[^;]*)"#).expect("Invalid parameter regex")
});

static DATETIME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{8}T\d{6})(Z?)$").expect("Invalid datetime regex"));

static DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8}$").expect("Invalid date regex"));

/// Parses `text` with floating times in the system local zone.
pub fn parse(text: &str) -> Vec<Event> {
    IcsParser::default().parse(text)
}

/// ICS parser with a configurable zone for floating times.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcsParser {
    zone: DisplayZone,
}

/// The first occurrence of each property we care about.
#[derive(Debug, Default)]
struct RawProperties<'a> {
    summary: Option<&'a str>,
    dtstart: Option<(&'a str, &'a str)>,
    dtend: Option<(&'a str, &'a str)>,
    location: Option<&'a str>,
    description: Option<&'a str>,
}

impl IcsParser {
    pub fn new(zone: DisplayZone) -> Self {
        Self { zone }
    }

    /// Extracts every `VEVENT` in feed order.
    pub fn parse(&self, text: &str) -> Vec<Event> {
        let unfolded = FOLD_REGEX.replace_all(text, "");
        let events: Vec<Event> = VEVENT_REGEX
            .captures_iter(&unfolded)
            .filter_map(|caps| caps.get(1))
            .map(|block| self.parse_block(block.as_str()))
            .collect();
        debug!(count = events.len(), "parsed ICS feed");
        events
    }

    fn parse_block(&self, block: &str) -> Event {
        let props = collect_properties(block);

        let start = props.dtstart.and_then(|(params, value)| self.parse_time(params, value));
        let end = props.dtend.and_then(|(params, value)| self.parse_time(params, value));
        let event = Event::new(props.summary.map(unescape).unwrap_or_default(), start, end)
            .with_location(props.location.map(unescape).unwrap_or_default())
            .with_description(props.description.map(unescape).unwrap_or_default());

        trace!(summary = %event.summary, start = ?event.start, end = ?event.end, "parsed VEVENT");
        event
    }

    /// Parses a `DTSTART`/`DTEND` value. Anything unrecognised yields `None`.
    fn parse_time(&self, params: &str, value: &str) -> Option<EventTime> {
        let value = value.trim();

        if DATE_REGEX.is_match(value) {
            return NaiveDate::parse_from_str(value, "%Y%m%d")
                .ok()
                .map(EventTime::AllDay);
        }

        let caps = DATETIME_REGEX.captures(value)?;
        let naive = NaiveDateTime::parse_from_str(&caps[1], "%Y%m%dT%H%M%S").ok()?;
        if &caps[2] == "Z" {
            return Some(EventTime::DateTime(naive.and_utc()));
        }

        let zone = tzid(params)
            .and_then(|name| match name.parse::<Tz>() {
                Ok(tz) => Some(DisplayZone::Named(tz)),
                Err(_) => {
                    debug!(tzid = name, "unknown TZID, using display zone");
                    None
                }
            })
            .unwrap_or(self.zone);
        Some(EventTime::DateTime(zone.resolve(naive)))
    }
}

/// Walks the block's lines, keeping the first value of each property.
/// Lines inside nested components (e.g. `VALARM`) are skipped.
fn collect_properties(block: &str) -> RawProperties<'_> {
    let mut props = RawProperties::default();
    let mut depth = 0usize;

    for line in block.lines() {
        let line = line.trim_end_matches('\r');
        let Some(caps) = PROPERTY_REGEX.captures(line) else {
            continue;
        };
        let (Some(name), Some(params), Some(value)) = (caps.get(1), caps.get(2), caps.get(3))
        else {
            continue;
        };
        let name = name.as_str();
        let (params, value) = (params.as_str(), value.as_str());

        if name.eq_ignore_ascii_case("BEGIN") {
            depth += 1;
            continue;
        }
        if name.eq_ignore_ascii_case("END") {
            depth = depth.saturating_sub(1);
            continue;
        }
        if depth > 0 {
            continue;
        }

        match name.to_ascii_uppercase().as_str() {
            "SUMMARY" => {
                props.summary.get_or_insert(value);
            }
            "DTSTART" => {
                props.dtstart.get_or_insert((params, value));
            }
            "DTEND" => {
                props.dtend.get_or_insert((params, value));
            }
            "LOCATION" => {
                props.location.get_or_insert(value);
            }
            "DESCRIPTION" => {
                props.description.get_or_insert(value);
            }
            _ => {}
        }
    }
    props
}

/// Returns the `TZID` parameter, without surrounding quotes.
fn tzid(params: &str) -> Option<&str> {
    PARAM_REGEX
        .captures_iter(params)
        .find(|caps| caps[1].eq_ignore_ascii_case("TZID"))
        .and_then(|caps| caps.get(2))
        .map(|value| value.as_str().trim_matches('"'))
}

/// Reverses RFC 5545 text escaping.
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out.trim().to_string()
}
