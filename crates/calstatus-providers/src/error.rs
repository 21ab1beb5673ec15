//! Errors raised while fetching or decoding calendar data.
//!
//! A [`ProviderError`] never escapes a source adapter: the adapter logs it and
//! reports its [`ProviderErrorCode`] as the source's error label.

use std::fmt;
use thiserror::Error;

/// Classification of a provider failure. [`as_str`](Self::as_str) is what ends
/// up on the display and in `SourceResult` error labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Transport failure or a non-success HTTP status on a feed download.
    FetchFailed,
    /// The body could not be decoded.
    ParseFailed,
    /// Credentials missing, invalid or expired (HTTP 401).
    AuthenticationFailed,
    /// Credentials valid but not allowed (HTTP 403).
    AuthorizationFailed,
    /// HTTP 429.
    RateLimited,
    /// Any other non-success API status.
    ServerError,
    /// The source is not usable as configured.
    ConfigurationError,
}

impl ProviderErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchFailed => "fetch_failed",
            Self::ParseFailed => "parse_failed",
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::ConfigurationError => "configuration_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error from a calendar source.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// Source name, e.g. "ICS" or "OAuth".
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    pub fn fetch(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::FetchFailed, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ParseFailed, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthorizationFailed, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    /// Maps a non-success API status to an error.
    pub fn from_api_status(status: u16, body: &str) -> Self {
        let message = format!("HTTP {status}: {}", body.trim());
        match status {
            401 => Self::authentication(message),
            403 => Self::authorization(message),
            429 => Self::rate_limited(message),
            _ => Self::server(message),
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{provider}] ")?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
