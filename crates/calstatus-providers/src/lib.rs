//! Calendar sources and the adapters that turn them into busy/free answers.
//!
//! ```text
//!  ICS feed        Google (OAuth)     Google (service account)
//!     │                 │                      │
//!  IcsSource       GoogleSource           GoogleSource
//!     └────────── CalendarSource ──────────────┘
//!                       │  Vec<Event>
//!                       ▼
//!                 select_status
//!                       │
//!                 SourceAdapter ──▶ SourceResult
//! ```
//!
//! # Example
//!
//! ```ignore
//! use calstatus_providers::{FeedFetcher, IcsSource, SourceAdapter};
//!
//! let ics = IcsSource::new(url, FeedFetcher::new(timeout)?);
//! let adapter = SourceAdapter::new(Arc::new(ics), zone);
//! let result = adapter.fetch_status(MeetingType::Current).await;
//! ```

pub mod adapter;
pub mod error;
pub mod google;
pub mod ics;
pub mod select;
pub mod source;

#[cfg(test)]
mod test_support;

pub use adapter::SourceAdapter;
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use google::{
    CommandToken, CredentialProvider, GoogleCalendarClient, GoogleSource, StaticToken, TokenFile,
};
pub use ics::{FeedFetcher, IcsParser, IcsSource, fetch_feed, parse};
pub use select::select_status;
pub use source::{BoxFuture, CalendarSource, ErrorSource, EventQuery};
