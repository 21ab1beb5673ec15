//! What gets sent to the display device: styled text or an animation asset.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::status::StatusKind;

/// A text color, rendered as `R-G-B` for the device CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const GREEN: Self = Self(0, 255, 0);
    pub const RED: Self = Self(255, 0, 0);
    pub const YELLOW: Self = Self(255, 255, 0);
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.0, self.1, self.2)
    }
}

/// Color and font size for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub color: Rgb,
    pub size: u8,
}

impl TextStyle {
    /// Busy text is red and smaller so longer labels fit.
    pub fn for_status(kind: StatusKind) -> Self {
        match kind {
            StatusKind::Free => Self {
                color: Rgb::GREEN,
                size: 8,
            },
            StatusKind::Busy => Self {
                color: Rgb::RED,
                size: 6,
            },
            StatusKind::Error => Self {
                color: Rgb::YELLOW,
                size: 8,
            },
        }
    }
}

/// Whether the device shows text or a prepared animation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    Text,
    Animation,
}

/// Animation files per status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSet {
    pub free: PathBuf,
    pub busy: PathBuf,
    pub error: PathBuf,
}

impl Default for AssetSet {
    fn default() -> Self {
        Self {
            free: PathBuf::from("images/free_emoji.gif"),
            busy: PathBuf::from("images/busy_emoji.gif"),
            error: PathBuf::from("images/error_emoji.gif"),
        }
    }
}

impl AssetSet {
    pub fn for_status(&self, kind: StatusKind) -> &Path {
        match kind {
            StatusKind::Free => &self.free,
            StatusKind::Busy => &self.busy,
            StatusKind::Error => &self.error,
        }
    }
}

/// A fully resolved display update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayPayload {
    Text { text: String, color: Rgb, size: u8 },
    Asset { path: PathBuf },
}

impl DisplayPayload {
    /// Short description for logs.
    pub fn summary(&self) -> String {
        match self {
            Self::Text { text, .. } => text.clone(),
            Self::Asset { path } => path.display().to_string(),
        }
    }
}
