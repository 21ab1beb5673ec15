//! Driving the LED display through its command-line tool.
//!
//! The device protocol lives entirely in the external program. We only build
//! its argument list: fixed `base_args` (typically the device address)
//! followed by either the text arguments or the asset arguments, with
//! `{text}`, `{color}`, `{size}` and `{path}` placeholders filled in.

use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use calstatus_core::DisplayPayload;
use calstatus_providers::BoxFuture;
use regex::{Captures, Regex};
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(text|color|size|path)\}").expect("Invalid placeholder regex"));

/// Something that can show a payload.
pub trait DisplaySink: Send + Sync {
    fn show<'a>(&'a self, payload: &'a DisplayPayload) -> BoxFuture<'a, ServerResult<()>>;
}

/// Runs the display program once per update.
#[derive(Debug, Clone)]
pub struct DisplayCommand {
    program: String,
    base_args: Vec<String>,
    text_args: Vec<String>,
    asset_args: Vec<String>,
    timeout: Duration,
}

pub fn default_text_args() -> Vec<String> {
    [
        "--set-text",
        "{text}",
        "--text-size",
        "{size}",
        "--text-color",
        "{color}",
    ]
    .map(String::from)
    .to_vec()
}

pub fn default_asset_args() -> Vec<String> {
    ["--set-gif", "{path}"].map(String::from).to_vec()
}

impl DisplayCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            text_args: default_text_args(),
            asset_args: default_asset_args(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_base_args(mut self, args: Vec<String>) -> Self {
        self.base_args = args;
        self
    }

    #[must_use]
    pub fn with_text_args(mut self, args: Vec<String>) -> Self {
        self.text_args = args;
        self
    }

    #[must_use]
    pub fn with_asset_args(mut self, args: Vec<String>) -> Self {
        self.asset_args = args;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for `payload`, excluding the program itself.
    ///
    /// Each template argument is filled in one pass, so placeholder-like text
    /// inside a substituted value is left alone.
    pub fn args_for(&self, payload: &DisplayPayload) -> Vec<String> {
        let (template, text, color, size, path) = match payload {
            DisplayPayload::Text { text, color, size } => (
                self.text_args.as_slice(),
                text.clone(),
                color.to_string(),
                size.to_string(),
                String::new(),
            ),
            DisplayPayload::Asset { path } => (
                self.asset_args.as_slice(),
                String::new(),
                String::new(),
                String::new(),
                path.display().to_string(),
            ),
        };

        self.base_args
            .iter()
            .cloned()
            .chain(template.iter().map(|arg| {
                PLACEHOLDER_REGEX
                    .replace_all(arg, |caps: &Captures<'_>| match &caps[1] {
                        "text" => text.as_str(),
                        "color" => color.as_str(),
                        "size" => size.as_str(),
                        _ => path.as_str(),
                    })
                    .into_owned()
            }))
            .collect()
    }

    #[instrument(skip(self, payload), fields(program = %self.program))]
    async fn run(&self, payload: &DisplayPayload) -> ServerResult<()> {
        let args = self.args_for(payload);
        debug!(?args, "invoking display program");

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ServerError::DisplaySpawn {
                program: self.program.clone(),
                source,
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ServerError::DisplayTimeout {
                program: self.program.clone(),
            })?
            .map_err(|source| ServerError::DisplaySpawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ServerError::Display {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        debug!("display updated");
        Ok(())
    }
}

impl DisplaySink for DisplayCommand {
    fn show<'a>(&'a self, payload: &'a DisplayPayload) -> BoxFuture<'a, ServerResult<()>> {
        Box::pin(self.run(payload))
    }
}
