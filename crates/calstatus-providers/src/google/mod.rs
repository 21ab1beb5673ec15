//! Google Calendar source.
//!
//! [`GoogleSource`] lists the calendars a credential can read
//! (`calendarList.list`), fetches expanded event instances from each
//! (`events.list`) and merges them. Tokens come from a
//! [`CredentialProvider`]; the OAuth and service-account adapters differ
//! only in which provider they are built with.

mod client;
mod credentials;
mod source;

pub use client::{CALENDAR_API_BASE, CalendarListEntry, GoogleCalendarClient};
pub use credentials::{CommandToken, CredentialProvider, StaticToken, TokenFile};
pub use source::GoogleSource;
