//! Bounded-length text for the LED display.
//!
//! Labels follow one shape everywhere: `"<summary> @ <HH:MM|All day>"`,
//! optionally followed by `" (<location>)"`. [`truncate`] shortens them to the
//! display budget, preferring to cut at those separators.

mod payload;

use std::borrow::Cow;

use crate::event::Event;
use crate::status::{AggregateStatus, StatusKind};
use crate::time::{DisplayZone, EventTime};

pub use payload::{AssetSet, DisplayMode, DisplayPayload, Rgb, TextStyle};

/// Default character budget of the display.
pub const DEFAULT_MAX_LENGTH: usize = 30;

const ELLIPSIS: &str = "...";
const ALL_DAY: &str = "All day";

/// Renders the time part of a label: local `HH:MM`, or `All day`.
pub fn time_label(start: &EventTime, zone: DisplayZone) -> String {
    match start {
        EventTime::DateTime(dt) => zone.local_time(*dt).format("%H:%M").to_string(),
        EventTime::AllDay(_) => ALL_DAY.to_string(),
    }
}

/// `"<summary> @ <time>"`, or the bare summary when there is no start.
pub fn item_label(event: &Event, zone: DisplayZone) -> String {
    match &event.start {
        Some(start) => format!("{} @ {}", event.summary, time_label(start, zone)),
        None => event.summary.clone(),
    }
}

/// [`item_label`] plus the location in parentheses, when there is one.
pub fn event_label(event: &Event, zone: DisplayZone) -> String {
    let item = item_label(event, zone);
    let location = event.location.trim();
    if location.is_empty() {
        item
    } else {
        format!("{item} ({location})")
    }
}

/// Summarises a day's events: one item as is, two or three joined with
/// `" | "`, more as a count.
pub fn day_listing(day: &str, items: &[String]) -> String {
    match items.len() {
        1..=3 => format!("{day}: {}", items.join(" | ")),
        n => format!("{day}: {n} events"),
    }
}

/// Shortens `text` to at most `max` characters.
///
/// Text that fits is returned unchanged. Otherwise the result is a prefix of
/// `text` followed by `...`, cut before the last `" ("` or `" @ "` that fits,
/// else at the last space that fits, else mid-word. Separator and space cuts
/// must keep at least half the budget.
/// With `max <= 3` there is no room for the ellipsis and the text is simply
/// cut.
pub fn truncate(text: &str, max: usize) -> Cow<'_, str> {
    if text.chars().count() <= max {
        return Cow::Borrowed(text);
    }
    if max <= ELLIPSIS.len() {
        return Cow::Owned(text.chars().take(max).collect());
    }

    let budget = max - ELLIPSIS.len();
    // byte offset just past the first `budget` characters
    let limit = text
        .char_indices()
        .nth(budget)
        .map_or(text.len(), |(offset, _)| offset);

    let usable = |offset: usize| offset <= limit && text[..offset].chars().count() * 2 >= budget;

    let separator = text
        .match_indices(" (")
        .chain(text.match_indices(" @ "))
        .map(|(offset, _)| offset)
        .filter(|&offset| offset > 0 && usable(offset))
        .max();

    let word = || {
        text.match_indices(' ')
            .map(|(offset, _)| offset)
            .filter(|&offset| usable(offset))
            .max()
    };

    let cut = separator.or_else(word).unwrap_or(limit);
    let head = text[..cut].trim_end();
    Cow::Owned(format!("{head}{ELLIPSIS}"))
}

/// Formats events and statuses for a display of fixed width.
#[derive(Debug, Clone)]
pub struct DisplayFormatter {
    max_length: usize,
    zone: DisplayZone,
    busy_prefix: Option<String>,
}

impl Default for DisplayFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LENGTH, DisplayZone::Local)
    }
}

impl DisplayFormatter {
    pub fn new(max_length: usize, zone: DisplayZone) -> Self {
        Self {
            max_length,
            zone,
            busy_prefix: None,
        }
    }

    /// Prepends `prefix` to busy labels, e.g. `"BUSY: "`.
    #[must_use]
    pub fn with_busy_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.busy_prefix = Some(prefix.into());
        self
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn zone(&self) -> DisplayZone {
        self.zone
    }

    pub fn format_event(&self, event: &Event) -> String {
        truncate(&event_label(event, self.zone), self.max_length).into_owned()
    }

    pub fn format_aggregate(&self, status: &AggregateStatus) -> String {
        let text = match (&self.busy_prefix, status.status) {
            (Some(prefix), StatusKind::Busy) => Cow::Owned(format!("{prefix}{}", status.label)),
            _ => Cow::Borrowed(status.label.as_str()),
        };
        truncate(&text, self.max_length).into_owned()
    }

    /// Builds what the display CLI should show for `status`.
    pub fn payload(
        &self,
        status: &AggregateStatus,
        mode: DisplayMode,
        assets: &AssetSet,
    ) -> DisplayPayload {
        match mode {
            DisplayMode::Text => {
                let style = TextStyle::for_status(status.status);
                DisplayPayload::Text {
                    text: self.format_aggregate(status),
                    color: style.color,
                    size: style.size,
                }
            }
            DisplayMode::Animation => DisplayPayload::Asset {
                path: assets.for_status(status.status).to_path_buf(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn standup() -> Event {
        Event::timed(
            "Standup",
            Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap(),
        )
    }

    mod labels {
        use super::*;

        #[test]
        fn timed_event_label() {
            insta::assert_snapshot!(event_label(&standup(), DisplayZone::UTC), @"Standup @ 09:00");
        }

        #[test]
        fn label_with_location() {
            let event = standup().with_location("Room 1");
            insta::assert_snapshot!(event_label(&event, DisplayZone::UTC), @"Standup @ 09:00 (Room 1)");
        }

        #[test]
        fn label_in_named_zone() {
            let zone = DisplayZone::from_name("Europe/Warsaw").unwrap();
            insta::assert_snapshot!(event_label(&standup(), zone), @"Standup @ 11:00");
        }

        #[test]
        fn all_day_label() {
            let event = Event::all_day("Holiday", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
            insta::assert_snapshot!(item_label(&event, DisplayZone::UTC), @"Holiday @ All day");
        }

        #[test]
        fn listing_shapes() {
            let items: Vec<String> = ["A @ 09:00", "B @ 10:00", "C @ 11:00", "D @ 12:00", "E @ 13:00"]
                .iter()
                .map(ToString::to_string)
                .collect();
            insta::assert_snapshot!(day_listing("Today", &items[..1]), @"Today: A @ 09:00");
            insta::assert_snapshot!(day_listing("Today", &items[..3]), @"Today: A @ 09:00 | B @ 10:00 | C @ 11:00");
            insta::assert_snapshot!(day_listing("Tomorrow", &items), @"Tomorrow: 5 events");
        }
    }

    mod truncation {
        use super::*;

        #[test]
        fn fitting_text_is_borrowed() {
            assert!(matches!(truncate("Free", 30), Cow::Borrowed("Free")));
            assert_eq!(truncate("exactly", 7), "exactly");
        }

        #[test]
        fn cuts_before_location() {
            insta::assert_snapshot!(truncate("Lunch @ 12:00 (Cafeteria, fifth floor)", 20), @"Lunch @ 12:00...");
        }

        #[test]
        fn cuts_before_time_when_location_does_not_fit() {
            insta::assert_snapshot!(truncate("Architecture review @ 14:00 (Room 5)", 24), @"Architecture review...");
        }

        #[test]
        fn falls_back_to_word_boundary() {
            insta::assert_snapshot!(truncate("Quarterly planning with the whole team @ 14:00", 25), @"Quarterly planning...");
        }

        #[test]
        fn early_parenthesis_is_not_a_cut_point() {
            insta::assert_snapshot!(truncate("Sync (team A and B planning) @ 10:00", 25), @"Sync (team A and B...");
        }

        #[test]
        fn hard_cut_for_a_single_long_word() {
            insta::assert_snapshot!(truncate("Supercalifragilisticexpialidocious", 10), @"Superca...");
        }

        #[test]
        fn tiny_budgets_have_no_ellipsis() {
            assert_eq!(truncate("Standup", 3), "Sta");
            assert_eq!(truncate("Standup", 1), "S");
            assert_eq!(truncate("Standup", 0), "");
        }

        #[test]
        fn counts_characters_not_bytes() {
            let text = "Spotkanie zespołu @ 09:00 (Łódź)";
            let out = truncate(text, 28);
            assert!(out.chars().count() <= 28);
            assert_eq!(out, "Spotkanie zespołu @ 09:00...");
        }

        #[test]
        fn long_label_stays_within_budget() {
            let label = "Extremely long recurring cross-team sync @ 09:00 (Main hall)";
            assert_eq!(label.chars().count(), 60);
            let out = truncate(label, 25);
            assert!(out.chars().count() <= 25);
            assert!(out.ends_with("..."));
            assert!(label.starts_with(out.trim_end_matches("...")));
        }
    }

    mod formatter {
        use super::*;

        #[test]
        fn format_event_truncates() {
            let formatter = DisplayFormatter::new(20, DisplayZone::UTC);
            let event = standup().with_location("Conference room B");
            insta::assert_snapshot!(formatter.format_event(&event), @"Standup @ 09:00...");
        }

        #[test]
        fn busy_prefix_only_applies_to_busy() {
            let formatter = DisplayFormatter::new(30, DisplayZone::UTC).with_busy_prefix("BUSY: ");
            let busy = AggregateStatus::new(StatusKind::Busy, "Standup @ 09:00");
            let free = AggregateStatus::new(StatusKind::Free, "Free");
            insta::assert_snapshot!(formatter.format_aggregate(&busy), @"BUSY: Standup @ 09:00");
            insta::assert_snapshot!(formatter.format_aggregate(&free), @"Free");
        }

        #[test]
        fn text_payload_uses_status_style() {
            let formatter = DisplayFormatter::new(30, DisplayZone::UTC);
            let busy = AggregateStatus::new(StatusKind::Busy, "Standup @ 09:00");
            let payload = formatter.payload(&busy, DisplayMode::Text, &AssetSet::default());
            assert_eq!(
                payload,
                DisplayPayload::Text {
                    text: "Standup @ 09:00".to_string(),
                    color: Rgb(255, 0, 0),
                    size: 6,
                }
            );
        }

        #[test]
        fn animation_payload_uses_asset() {
            let formatter = DisplayFormatter::default();
            let error = AggregateStatus::new(StatusKind::Error, "No calendar sources configured");
            let payload = formatter.payload(&error, DisplayMode::Animation, &AssetSet::default());
            assert_eq!(
                payload,
                DisplayPayload::Asset {
                    path: "images/error_emoji.gif".into()
                }
            );
        }
    }
}
