//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parley - retries, circuit breaking and provider fallback for AI backends
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Inspect Parley resilience configuration", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Print the nominal retry delay before each attempt
    Backoff {
        /// Read the retry policy from this file instead of the layered defaults
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration as JSON
    Show {
        /// Show this file instead of the layered defaults
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Validate a configuration file
    Check {
        /// Path to the configuration file
        file: PathBuf,
    },
}
