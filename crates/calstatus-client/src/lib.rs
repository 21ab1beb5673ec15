//! CLI, configuration, source wiring, poll commands
//!
//! This crate provides the `calstatus` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;
pub mod sources;

pub use cli::Cli;
pub use config::AppConfig;
pub use error::{ClientError, ClientResult};
