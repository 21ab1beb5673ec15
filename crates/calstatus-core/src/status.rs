//! Busy/free status types.
//!
//! - [`MeetingType`]: which question a poll answers
//! - [`SourceStatus`] / [`SourceResult`]: one source's opinion
//! - [`AggregateStatus`]: the reconciled decision

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which events a poll looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingType {
    /// The meeting happening right now.
    #[default]
    Current,
    /// The next meeting starting from now.
    Next,
    /// Every event starting today.
    Today,
    /// Every event starting tomorrow.
    Tomorrow,
}

impl MeetingType {
    pub const ALL: [MeetingType; 4] = [Self::Current, Self::Next, Self::Today, Self::Tomorrow];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Next => "next",
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
        }
    }
}

impl fmt::Display for MeetingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown meeting type '{0}' (expected current, next, today or tomorrow)")]
pub struct UnknownMeetingType(pub String);

impl FromStr for MeetingType {
    type Err = UnknownMeetingType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownMeetingType(s.to_string()))
    }
}

/// The projection of a status onto its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusKind {
    Busy,
    Free,
    Error,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Busy => "BUSY",
            Self::Free => "FREE",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source's answer. The error variant carries a short diagnostic rather
/// than an error value, so a failed source is still a plain result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "label", rename_all = "UPPERCASE")]
pub enum SourceStatus {
    Busy(String),
    Free(String),
    Error(String),
}

impl SourceStatus {
    pub fn kind(&self) -> StatusKind {
        match self {
            Self::Busy(_) => StatusKind::Busy,
            Self::Free(_) => StatusKind::Free,
            Self::Error(_) => StatusKind::Error,
        }
    }

    /// The carried label, or the diagnostic for errors.
    pub fn label(&self) -> &str {
        match self {
            Self::Busy(label) | Self::Free(label) | Self::Error(label) => label,
        }
    }
}

/// A named source's status for one poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceResult {
    pub source_name: String,
    #[serde(flatten)]
    pub status: SourceStatus,
}

impl SourceResult {
    pub fn new(source_name: impl Into<String>, status: SourceStatus) -> Self {
        Self {
            source_name: source_name.into(),
            status,
        }
    }

    pub fn busy(source_name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(source_name, SourceStatus::Busy(label.into()))
    }

    pub fn free(source_name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(source_name, SourceStatus::Free(label.into()))
    }

    pub fn error(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(source_name, SourceStatus::Error(reason.into()))
    }

    pub fn status(&self) -> StatusKind {
        self.status.kind()
    }

    pub fn label(&self) -> &str {
        self.status.label()
    }
}

/// The single decision handed to the display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStatus {
    pub status: StatusKind,
    pub label: String,
}

impl AggregateStatus {
    pub fn new(status: StatusKind, label: impl Into<String>) -> Self {
        Self {
            status,
            label: label.into(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.status == StatusKind::Busy
    }
}
