//! Access token sources for the Google Calendar API.
//!
//! Tokens are obtained from outside this program: a literal, a JSON file
//! kept fresh by another tool, or a command such as
//! `gcloud auth print-access-token`. Nothing here refreshes or stores
//! credentials.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::source::BoxFuture;

/// Something that can hand out a bearer token.
pub trait CredentialProvider: Send + Sync + fmt::Debug {
    /// Returns a usable access token.
    ///
    /// # Errors
    ///
    /// Returns an `authentication_failed` error when no valid token is
    /// available.
    fn access_token(&self) -> BoxFuture<'_, ProviderResult<String>>;
}

/// A token given directly in configuration.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(***)")
    }
}

impl CredentialProvider for StaticToken {
    fn access_token(&self) -> BoxFuture<'_, ProviderResult<String>> {
        Box::pin(async move {
            if self.0.trim().is_empty() {
                return Err(ProviderError::authentication("access token is empty"));
            }
            Ok(self.0.clone())
        })
    }
}

/// A JSON token file, re-read on every call.
///
/// Accepts both `{"access_token", "expires_at"}` and the
/// `{"token", "expiry"}` layout written by Google's Python client. Expiry
/// timestamps without an offset are taken as UTC.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct TokenFileContents {
    #[serde(alias = "token")]
    access_token: Option<String>,
    #[serde(alias = "expiry")]
    expires_at: Option<String>,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn check(&self, contents: TokenFileContents, now: DateTime<Utc>) -> ProviderResult<String> {
        let token = contents
            .access_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::authentication(format!(
                    "no access token in {}",
                    self.path.display()
                ))
            })?;

        if let Some(raw) = contents.expires_at.as_deref() {
            let expires_at = parse_expiry(raw).ok_or_else(|| {
                ProviderError::parse(format!("invalid expiry '{raw}' in {}", self.path.display()))
            })?;
            if expires_at <= now {
                return Err(ProviderError::authentication(format!(
                    "access token expired at {expires_at}"
                )));
            }
        }
        Ok(token)
    }
}

fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

impl CredentialProvider for TokenFile {
    fn access_token(&self) -> BoxFuture<'_, ProviderResult<String>> {
        Box::pin(async move {
            let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
                ProviderError::authentication(format!(
                    "cannot read token file {}",
                    self.path.display()
                ))
                .with_source(e)
            })?;
            let contents: TokenFileContents = serde_json::from_str(&content).map_err(|e| {
                ProviderError::parse(format!("malformed token file {}", self.path.display()))
                    .with_source(e)
            })?;
            debug!(path = %self.path.display(), "read token file");
            self.check(contents, Utc::now())
        })
    }
}

/// Runs a command and uses the first non-empty line of its output.
#[derive(Debug, Clone)]
pub struct CommandToken {
    program: String,
    args: Vec<String>,
}

impl CommandToken {
    /// Builds from an argv list. Returns `None` for an empty list.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl CredentialProvider for CommandToken {
    fn access_token(&self) -> BoxFuture<'_, ProviderResult<String>> {
        Box::pin(async move {
            let output = tokio::process::Command::new(&self.program)
                .args(&self.args)
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|e| {
                    ProviderError::configuration(format!("cannot run {}", self.program))
                        .with_source(e)
                })?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(ProviderError::authentication(format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    stderr.trim()
                )));
            }

            String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(ToString::to_string)
                .ok_or_else(|| {
                    ProviderError::authentication(format!("{} printed no token", self.program))
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use std::io::Write;

    fn token_file(json: &str) -> (tempfile::NamedTempFile, TokenFile) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        let provider = TokenFile::new(file.path());
        (file, provider)
    }

    #[tokio::test]
    async fn static_token() {
        assert_eq!(StaticToken::new("abc").access_token().await.unwrap(), "abc");
        let err = StaticToken::new(" ").access_token().await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
    }

    #[test]
    fn static_token_debug_hides_value() {
        assert_eq!(format!("{:?}", StaticToken::new("abc")), "StaticToken(***)");
    }

    #[tokio::test]
    async fn token_file_with_future_expiry() {
        let (_f, provider) =
            token_file(r#"{"access_token": "ya29.tok", "expires_at": "2999-01-01T00:00:00Z"}"#);
        assert_eq!(provider.access_token().await.unwrap(), "ya29.tok");
    }

    #[tokio::test]
    async fn token_file_python_layout() {
        let (_f, provider) = token_file(
            r#"{"token": "ya29.py", "refresh_token": "r", "expiry": "2999-01-01T00:00:00.123456"}"#,
        );
        assert_eq!(provider.access_token().await.unwrap(), "ya29.py");
    }

    #[tokio::test]
    async fn expired_token_is_auth_error() {
        let (_f, provider) =
            token_file(r#"{"access_token": "old", "expires_at": "2020-01-01T00:00:00Z"}"#);
        let err = provider.access_token().await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert!(err.message().contains("expired"));
    }

    #[tokio::test]
    async fn token_without_expiry_is_accepted() {
        let (_f, provider) = token_file(r#"{"access_token": "forever"}"#);
        assert_eq!(provider.access_token().await.unwrap(), "forever");
    }

    #[tokio::test]
    async fn missing_file_and_bad_json() {
        let missing = TokenFile::new("/nonexistent/calstatus/token.json");
        assert_eq!(
            missing.access_token().await.unwrap_err().code(),
            ProviderErrorCode::AuthenticationFailed
        );

        let (_f, provider) = token_file("not json");
        assert_eq!(
            provider.access_token().await.unwrap_err().code(),
            ProviderErrorCode::ParseFailed
        );
    }

    #[tokio::test]
    async fn command_token_uses_first_line() {
        let argv = vec![
            "sh".to_string(),
            "-c".to_string(),
            "printf '\\n  tok-123  \\nsecond\\n'".to_string(),
        ];
        let provider = CommandToken::from_argv(&argv).unwrap();
        assert_eq!(provider.access_token().await.unwrap(), "tok-123");
    }

    #[tokio::test]
    async fn failing_command_is_auth_error() {
        let provider = CommandToken::from_argv(&["false".to_string()]).unwrap();
        let err = provider.access_token().await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
    }

    #[test]
    fn empty_argv_is_rejected() {
        assert!(CommandToken::from_argv(&[]).is_none());
    }
}
