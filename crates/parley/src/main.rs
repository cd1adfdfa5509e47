//! Parley CLI binary.
//!
//! Inspect and validate resilience configuration:
//! - Print the effective layered configuration
//! - Validate a configuration file
//! - Preview the retry backoff schedule

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, handle_config_command, show_backoff};

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Config(config_cmd) => handle_config_command(config_cmd)?,
        Commands::Backoff { config } => show_backoff(config.as_deref())?,
    }

    Ok(())
}
