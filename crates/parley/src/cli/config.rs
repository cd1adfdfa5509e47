//! Configuration command handlers.

use super::commands::ConfigCommands;
use super::resolve_config;
use parley::{ConfigError, ParleyConfig, ParleyResult};

/// Handle configuration commands.
pub fn handle_config_command(cmd: ConfigCommands) -> ParleyResult<()> {
    match cmd {
        ConfigCommands::Show { file } => {
            let config = resolve_config(file.as_deref())?;
            let json = serde_json::to_string_pretty(&config)
                .map_err(|e| ConfigError::new(format!("Failed to render configuration: {}", e)))?;
            println!("{}", json);
            Ok(())
        }

        ConfigCommands::Check { file } => {
            let config = ParleyConfig::from_file(&file)?;
            let endpoints: usize = config.rate_limits.values().map(|e| e.len()).sum();
            println!(
                "{}: ok ({} providers, {} rate-limited endpoints)",
                file.display(),
                config.rate_limits.len(),
                endpoints
            );
            Ok(())
        }
    }
}
