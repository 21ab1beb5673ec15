//! Configuration commands.

use std::path::Path;

use crate::config::AppConfig;
use crate::error::{ClientError, ClientResult};
use crate::secret;

/// Dump the effective configuration to stdout.
pub fn dump(config: &AppConfig, path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Output(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);
    Ok(())
}

/// Validate the configuration, including secret references.
pub fn validate(config: &AppConfig) -> ClientResult<()> {
    config.validate()?;

    let tokens = [
        config.ics.bearer_token.as_deref(),
        config.oauth.as_ref().and_then(|s| s.access_token.as_deref()),
        config
            .service_account
            .as_ref()
            .and_then(|s| s.access_token.as_deref()),
    ];
    for token in tokens.into_iter().flatten() {
        if secret::is_reference(token) {
            secret::resolve(token)?;
        }
    }

    let sources = config.enabled_sources();
    if sources.is_empty() {
        println!("No calendar sources enabled.");
    } else {
        println!("Sources: {}", sources.join(", "));
    }
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> ClientResult<()> {
    println!("config: {}", path.display());
    Ok(())
}
