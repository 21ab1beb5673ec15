//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/calstatus/config.toml` by default. A source is enabled by its
//! settings: `ics_feed_url` for the ICS feed, an `[oauth]` section for the
//! OAuth adapter and a `[service_account]` section for the service account.
//!
//! Token values (`bearer_token`, `access_token`) support secret references
//! (`pass::…`, `env::…`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use calstatus_core::{AssetSet, DisplayMode, DisplayZone, MeetingType};
use calstatus_server::{SchedulerConfig, default_asset_args, default_text_args};

use crate::error::{ClientError, ClientResult};

pub const ICS_SOURCE: &str = "ICS";
pub const OAUTH_SOURCE: &str = "OAuth";
pub const SERVICE_SOURCE: &str = "Service";

/// Source name for a `source_priority` entry, case-insensitive. Config
/// section names are accepted too, so `service_account` means `Service`.
pub fn source_name(entry: &str) -> Option<&'static str> {
    match entry.trim().to_ascii_lowercase().as_str() {
        "ics" => Some(ICS_SOURCE),
        "oauth" => Some(OAUTH_SOURCE),
        "service" | "service_account" => Some(SERVICE_SOURCE),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// AppConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the calstatus binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// URL of the ICS feed. Enables the ICS source.
    pub ics_feed_url: Option<String>,

    /// Meeting type used when `--type` is not given.
    pub meeting_type_default: MeetingType,

    /// Source names, highest priority first.
    pub source_priority: Vec<String>,

    /// IANA timezone for rendering and day boundaries. System local if unset.
    pub timezone: Option<String>,

    /// Debug logging.
    pub debug: bool,

    pub ics: IcsSettings,

    /// OAuth adapter. Absent section disables it.
    pub oauth: Option<GoogleSettings>,

    /// Service-account adapter. Absent section disables it.
    pub service_account: Option<GoogleSettings>,

    pub display: DisplaySettings,

    pub schedule: ScheduleSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ics_feed_url: None,
            meeting_type_default: MeetingType::Current,
            source_priority: vec!["ics".into(), "oauth".into(), "service".into()],
            timezone: None,
            debug: false,
            ics: IcsSettings::default(),
            oauth: None,
            service_account: None,
            display: DisplaySettings::default(),
            schedule: ScheduleSettings::default(),
        }
    }
}

/// ICS feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IcsSettings {
    /// Bearer token sent with the feed request.
    pub bearer_token: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for IcsSettings {
    fn default() -> Self {
        Self {
            bearer_token: None,
            timeout_secs: 30,
        }
    }
}

/// Google Calendar credentials and calendar selection.
///
/// Exactly one credential is used, checked in this order: `access_token`,
/// `token_file`, `token_command`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// A literal access token (supports `pass::` and `env::` prefixes).
    pub access_token: Option<String>,

    /// JSON file holding an access token, kept fresh by an external tool.
    pub token_file: Option<PathBuf>,

    /// Command printing an access token, e.g. `gcloud auth print-access-token`.
    pub token_command: Vec<String>,

    /// Calendars to query. Empty means every calendar the credential can read.
    pub calendar_ids: Vec<String>,

    /// Request timeout in seconds. Defaults to 30.
    pub timeout_secs: Option<u64>,
}

impl GoogleSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(30))
    }

    pub fn has_credentials(&self) -> bool {
        self.access_token.is_some() || self.token_file.is_some() || !self.token_command.is_empty()
    }
}

/// Display device settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Maximum label length in characters.
    pub max_length: usize,

    /// Show text or a per-status animation.
    pub mode: DisplayMode,

    /// Display tool to run.
    pub program: String,

    /// Arguments passed before the payload, typically the device address.
    pub base_args: Vec<String>,

    /// Payload arguments for text mode (`{text}`, `{color}`, `{size}`).
    pub text_args: Vec<String>,

    /// Payload arguments for animation mode (`{path}`).
    pub asset_args: Vec<String>,

    /// Text prepended to busy labels, e.g. `"BUSY: "`.
    pub busy_prefix: Option<String>,

    /// Seconds to wait for the display tool.
    pub timeout_secs: u64,

    /// Animation files.
    pub assets: AssetSet,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            max_length: 30,
            mode: DisplayMode::Text,
            program: "./run_in_venv.sh".into(),
            base_args: Vec::new(),
            text_args: default_text_args(),
            asset_args: default_asset_args(),
            busy_prefix: None,
            timeout_secs: 30,
            assets: AssetSet::default(),
        }
    }
}

/// Poll loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Seconds between polls.
    pub interval_secs: u64,

    /// Poll at wall-clock multiples of the interval.
    pub align_to_interval: bool,

    /// Seconds to reuse a decision. 0 disables the cache.
    pub cache_ttl_secs: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            interval_secs: 1800,
            align_to_interval: true,
            cache_ttl_secs: 0,
        }
    }
}

impl ScheduleSettings {
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::new(Duration::from_secs(self.interval_secs))
            .with_alignment(self.align_to_interval)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl AppConfig {
    /// Loads `path`, or the default path when `None`.
    ///
    /// A missing file at the default location yields the defaults; an
    /// explicitly given path must exist.
    pub fn load(path: Option<&Path>) -> ClientResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ClientResult<Self> {
        toml::from_str(content).map_err(|e| ClientError::config(format!("failed to parse config: {}", e)))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calstatus")
    }

    /// The configured display zone.
    pub fn zone(&self) -> ClientResult<DisplayZone> {
        match self.timezone.as_deref() {
            None => Ok(DisplayZone::Local),
            Some(name) => name
                .parse()
                .map_err(|e| ClientError::config(format!("invalid timezone: {}", e))),
        }
    }

    /// Checks everything that can be checked without network access.
    pub fn validate(&self) -> ClientResult<()> {
        self.zone()?;

        if let Some(raw) = &self.ics_feed_url {
            let url = url::Url::parse(raw)
                .map_err(|e| ClientError::config(format!("invalid ics_feed_url '{}': {}", raw, e)))?;
            if !matches!(url.scheme(), "http" | "https" | "webcal") {
                return Err(ClientError::config(format!(
                    "ics_feed_url must be http(s), got scheme '{}'",
                    url.scheme()
                )));
            }
        }

        for (section, settings) in [
            ("oauth", &self.oauth),
            ("service_account", &self.service_account),
        ] {
            if let Some(settings) = settings
                && !settings.has_credentials()
            {
                return Err(ClientError::config(format!(
                    "[{}] needs one of access_token, token_file or token_command",
                    section
                )));
            }
        }

        for entry in &self.source_priority {
            if source_name(entry).is_none() {
                return Err(ClientError::config(format!(
                    "unknown source '{}' in source_priority (expected ics, oauth or service)",
                    entry
                )));
            }
        }

        if self.display.max_length == 0 {
            return Err(ClientError::config("display.max_length must be positive"));
        }
        if self.display.program.trim().is_empty() {
            return Err(ClientError::config("display.program must not be empty"));
        }
        if self.schedule.interval_secs == 0 {
            return Err(ClientError::config("schedule.interval_secs must be positive"));
        }
        Ok(())
    }

    /// Source names in the order they are enabled.
    pub fn enabled_sources(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.ics_feed_url.is_some() {
            names.push(ICS_SOURCE);
        }
        if self.oauth.is_some() {
            names.push(OAUTH_SOURCE);
        }
        if self.service_account.is_some() {
            names.push(SERVICE_SOURCE);
        }
        names
    }
}

/// Expands a leading `~/` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}
