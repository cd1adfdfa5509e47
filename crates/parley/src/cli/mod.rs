//! Command-line interface module.

mod backoff;
mod commands;
mod config;

pub use backoff::show_backoff;
pub use commands::{Cli, Commands};
pub use config::handle_config_command;

use parley::{ParleyConfig, ParleyResult};
use std::path::Path;

/// Configuration from `path`, or the layered defaults when absent.
fn resolve_config(path: Option<&Path>) -> ParleyResult<ParleyConfig> {
    match path {
        Some(path) => ParleyConfig::from_file(path),
        None => ParleyConfig::load(),
    }
}
