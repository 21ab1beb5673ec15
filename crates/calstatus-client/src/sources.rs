//! Builds calendar sources from configuration.
//!
//! A source that is enabled but misconfigured (unresolvable token, missing
//! credential) is still built, as an [`ErrorSource`], so it shows up as
//! unavailable in every poll instead of silently disappearing.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use calstatus_core::{DisplayZone, Reconciler};
use calstatus_providers::{
    CalendarSource, CommandToken, CredentialProvider, ErrorSource, FeedFetcher,
    GoogleCalendarClient, GoogleSource, IcsSource, ProviderError, ProviderResult, SourceAdapter,
    StaticToken, TokenFile,
};

use crate::config::{
    AppConfig, GoogleSettings, ICS_SOURCE, OAUTH_SOURCE, SERVICE_SOURCE, expand_home, source_name,
};
use crate::secret;

/// Every enabled source, in configuration order.
pub fn build_sources(config: &AppConfig) -> Vec<Arc<dyn CalendarSource>> {
    let mut sources: Vec<Arc<dyn CalendarSource>> = Vec::new();

    if let Some(url) = &config.ics_feed_url {
        sources.push(or_error(ICS_SOURCE, ics_source(config, url)));
    }
    if let Some(settings) = &config.oauth {
        sources.push(or_error(OAUTH_SOURCE, google_source(OAUTH_SOURCE, settings)));
    }
    if let Some(settings) = &config.service_account {
        sources.push(or_error(SERVICE_SOURCE, google_source(SERVICE_SOURCE, settings)));
    }

    for source in &sources {
        info!(name = source.name(), "source registered");
    }
    sources
}

/// Wraps every enabled source in an adapter for `zone`.
pub fn build_adapters(config: &AppConfig, zone: DisplayZone) -> Vec<SourceAdapter> {
    build_sources(config)
        .into_iter()
        .map(|source| SourceAdapter::new(source, zone))
        .collect()
}

/// Unknown priority entries are dropped; `validate` reports them.
pub fn build_reconciler(config: &AppConfig) -> Reconciler {
    Reconciler::new(
        config
            .source_priority
            .iter()
            .filter_map(|entry| source_name(entry)),
    )
}

fn or_error(
    name: &str,
    source: ProviderResult<Arc<dyn CalendarSource>>,
) -> Arc<dyn CalendarSource> {
    source.unwrap_or_else(|e| {
        warn!(source = name, error = %e, "source misconfigured");
        Arc::new(ErrorSource::new(name, e))
    })
}

fn resolve_secret(value: &str) -> ProviderResult<String> {
    secret::resolve(value).map_err(|e| ProviderError::configuration(e.to_string()).with_source(e))
}

/// `webcal://` is how calendar apps advertise a subscription; it is fetched
/// over https.
fn feed_url(raw: &str) -> String {
    match raw.split_once("://") {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("webcal") => format!("https://{}", rest),
        _ => raw.to_string(),
    }
}

fn ics_source(config: &AppConfig, url: &str) -> ProviderResult<Arc<dyn CalendarSource>> {
    let fetcher = FeedFetcher::new(Duration::from_secs(config.ics.timeout_secs))?;
    let mut source = IcsSource::new(feed_url(url), fetcher).with_name(ICS_SOURCE);
    if let Some(token) = &config.ics.bearer_token {
        source = source.with_bearer_token(resolve_secret(token)?);
    }
    Ok(Arc::new(source))
}

fn credentials(settings: &GoogleSettings) -> ProviderResult<Arc<dyn CredentialProvider>> {
    if let Some(token) = &settings.access_token {
        return Ok(Arc::new(StaticToken::new(resolve_secret(token)?)));
    }
    if let Some(path) = &settings.token_file {
        return Ok(Arc::new(TokenFile::new(expand_home(path))));
    }
    CommandToken::from_argv(&settings.token_command)
        .map(|cmd| Arc::new(cmd) as Arc<dyn CredentialProvider>)
        .ok_or_else(|| {
            ProviderError::configuration(
                "no credential configured (access_token, token_file or token_command)",
            )
        })
}

fn google_source(name: &str, settings: &GoogleSettings) -> ProviderResult<Arc<dyn CalendarSource>> {
    let client = GoogleCalendarClient::new(settings.timeout())?;
    let source = GoogleSource::new(name, client, credentials(settings)?)
        .with_calendar_ids(settings.calendar_ids.clone());
    Ok(Arc::new(source))
}
