//! Errors from the poll loop and the display command.

use std::io;
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    /// The display program could not be started.
    #[error("failed to run display program {program}: {source}")]
    DisplaySpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The display program ran but reported failure.
    #[error("display program {program} failed ({status}): {stderr}")]
    Display {
        program: String,
        status: String,
        stderr: String,
    },

    /// The display program did not finish in time.
    #[error("display program {program} timed out")]
    DisplayTimeout { program: String },

    /// Signal handlers could not be installed.
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] io::Error),
}

impl ServerError {
    /// Returns true for failures of the display device rather than of the
    /// calendar side.
    pub fn is_display(&self) -> bool {
        matches!(
            self,
            Self::DisplaySpawn { .. } | Self::Display { .. } | Self::DisplayTimeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_errors_are_classified() {
        let err = ServerError::Display {
            program: "led".into(),
            status: "exit status: 2".into(),
            stderr: "device not found".into(),
        };
        assert!(err.is_display());
        assert_eq!(
            err.to_string(),
            "display program led failed (exit status: 2): device not found"
        );
        let signal = ServerError::Signal(io::Error::other("denied"));
        assert!(!signal.is_display());
    }
}
