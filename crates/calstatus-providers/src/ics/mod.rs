//! ICS feed source.
//!
//! - [`parse`] / [`IcsParser`]: text to events, no calendar library involved
//! - [`FeedFetcher`] / [`fetch_feed`]: HTTP download
//! - [`IcsSource`]: both, behind [`CalendarSource`](crate::source::CalendarSource)

mod fetch;
mod parse;
mod source;

pub use fetch::{DEFAULT_TIMEOUT, FeedFetcher, fetch_feed};
pub use parse::{IcsParser, parse};
pub use source::IcsSource;
