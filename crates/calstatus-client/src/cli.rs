//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use calstatus_core::MeetingType;

/// calstatus - calendar busy/free status on an LED display
#[derive(Debug, Parser)]
#[command(name = "calstatus")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "CALSTATUS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll every source once and print the reconciled status
    Status {
        /// Which meetings to look at (current, next, today, tomorrow)
        #[arg(long = "type", short = 't')]
        meeting_type: Option<MeetingType>,

        /// Also push the result to the display
        #[arg(long)]
        display: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Keep the display updated on a fixed interval
    Run {
        /// Which meetings to look at (current, next, today, tomorrow)
        #[arg(long = "type", short = 't')]
        meeting_type: Option<MeetingType>,

        /// Seconds between polls, overriding the configuration
        #[arg(long)]
        interval: Option<u64>,

        /// Update the display once and exit
        #[arg(long)]
        once: bool,
    },

    /// List the events each source returns
    Events {
        /// Which meetings to look at (current, next, today, tomorrow)
        #[arg(long = "type", short = 't')]
        meeting_type: Option<MeetingType>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
