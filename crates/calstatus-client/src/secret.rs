//! Secret reference resolver.
//!
//! Token values in `config.toml` can point at secrets stored outside the file:
//!
//! - `pass::path/in/store` runs `pass show path/in/store` and takes the first line
//! - `env::VAR_NAME` reads `$VAR_NAME`
//! - anything else is used as-is

use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("environment variable `{0}` is not set")]
    MissingEnv(String),

    #[error("failed to run `pass show {path}`: {source}")]
    PassSpawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`pass show {path}` failed ({status}): {stderr}")]
    PassFailed {
        path: String,
        status: String,
        stderr: String,
    },

    #[error("secret reference `{0}` resolved to an empty value")]
    Empty(String),
}

/// Resolves a value that may contain a secret reference prefix.
///
/// # Errors
///
/// Fails when the referenced variable or `pass` entry is missing, or when the
/// reference resolves to nothing.
pub fn resolve(value: &str) -> Result<String, SecretError> {
    let resolved = if let Some(path) = value.strip_prefix("pass::") {
        resolve_pass(path)?
    } else if let Some(var) = value.strip_prefix("env::") {
        std::env::var(var).map_err(|_| SecretError::MissingEnv(var.to_string()))?
    } else {
        return Ok(value.to_string());
    };

    let resolved = resolved.trim().to_string();
    if resolved.is_empty() {
        return Err(SecretError::Empty(value.to_string()));
    }
    Ok(resolved)
}

/// Returns true if `value` is a `pass::` or `env::` reference.
pub fn is_reference(value: &str) -> bool {
    value.starts_with("pass::") || value.starts_with("env::")
}

fn resolve_pass(path: &str) -> Result<String, SecretError> {
    let output = Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|source| SecretError::PassSpawn {
            path: path.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(SecretError::PassFailed {
            path: path.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passthrough() {
        assert_eq!(resolve("ya29.token").unwrap(), "ya29.token");
        assert_eq!(resolve("").unwrap(), "");
        assert!(!is_reference("ya29.token"));
    }

    #[test]
    fn env_prefix_resolves() {
        unsafe {
            std::env::set_var("_CALSTATUS_TEST_ICS_TOKEN", "feed-secret\n");
        }
        assert_eq!(resolve("env::_CALSTATUS_TEST_ICS_TOKEN").unwrap(), "feed-secret");
        assert!(is_reference("env::_CALSTATUS_TEST_ICS_TOKEN"));
        unsafe {
            std::env::remove_var("_CALSTATUS_TEST_ICS_TOKEN");
        }
    }

    #[test]
    fn env_prefix_missing_var_errors() {
        let err = resolve("env::_CALSTATUS_NONEXISTENT_VAR_12345").unwrap_err();
        assert!(matches!(err, SecretError::MissingEnv(_)));
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn empty_env_value_errors() {
        unsafe {
            std::env::set_var("_CALSTATUS_TEST_EMPTY", "  ");
        }
        let err = resolve("env::_CALSTATUS_TEST_EMPTY").unwrap_err();
        assert!(matches!(err, SecretError::Empty(_)));
        unsafe {
            std::env::remove_var("_CALSTATUS_TEST_EMPTY");
        }
    }

    #[test]
    fn pass_prefix_missing_entry_errors() {
        // fails whether or not `pass` is installed
        assert!(resolve("pass::calstatus/nonexistent/entry/12345").is_err());
    }
}
