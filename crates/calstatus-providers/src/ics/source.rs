use calstatus_core::Event;
use tracing::debug;

use crate::error::ProviderResult;
use crate::ics::{FeedFetcher, IcsParser};
use crate::source::{BoxFuture, CalendarSource, EventQuery};

/// A calendar backed by a single ICS URL.
#[derive(Debug, Clone)]
pub struct IcsSource {
    name: String,
    url: String,
    bearer_token: Option<String>,
    fetcher: FeedFetcher,
}

impl IcsSource {
    pub fn new(url: impl Into<String>, fetcher: FeedFetcher) -> Self {
        Self {
            name: "ICS".to_string(),
            url: url.into(),
            bearer_token: None,
            fetcher,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

impl CalendarSource for IcsSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        Box::pin(async move {
            let body = self
                .fetcher
                .fetch(&self.url, self.bearer_token.as_deref())
                .await
                .map_err(|e| e.with_provider(&self.name))?;
            let events = IcsParser::new(query.zone).parse(&body);
            debug!(source = %self.name, count = events.len(), "ICS events");
            Ok(events)
        })
    }
}
