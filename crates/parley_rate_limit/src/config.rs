//! TOML-based configuration for the resilience layer.
//!
//! Configuration is layered with the `config` crate:
//! - Bundled defaults (include_str! from parley.toml)
//! - User config in the home directory (~/.config/parley/parley.toml)
//! - User config in the current directory (./parley.toml)

use crate::{CostModel, RateLimiter};
use config::{Config, File, FileFormat};
use parley_core::{Capability, CircuitBreakerConfig, RetryConfig, ServiceKey};
use parley_error::{ConfigError, ParleyError, ParleyResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// Fixed-window limit for one provider endpoint.
///
/// # Example
///
/// ```toml
/// [rate_limits.openai.transcription]
/// max_requests = 30
/// window_ms = 60000
/// max_cost = 3000
///
/// [rate_limits.openai.transcription.cost]
/// per_request = 0
/// per_audio_kilobyte = 1
/// minimum = 1
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointLimit {
    /// Requests admitted per window
    pub max_requests: u32,
    /// Window length in milliseconds
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    /// Cost units admitted per window (unbounded if absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cost: Option<f64>,
    /// How request cost is estimated
    #[serde(default)]
    pub cost: CostModel,
}

fn default_window_ms() -> u64 {
    60_000
}

impl EndpointLimit {
    /// Limit of `max_requests` per `window`, with no cost budget.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window_ms: window.as_millis() as u64,
            max_cost: None,
            cost: CostModel::default(),
        }
    }

    /// Add a cost budget for the window.
    pub fn with_max_cost(mut self, max_cost: f64) -> Self {
        self.max_cost = Some(max_cost);
        self
    }

    /// Replace the cost model.
    pub fn with_cost(mut self, cost: CostModel) -> Self {
        self.cost = cost;
        self
    }

    /// Window length as a `Duration`.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    fn validate(&self, key: &str) -> Result<(), String> {
        if self.max_requests == 0 {
            return Err(format!("{}: max_requests must be at least 1", key));
        }
        if self.window_ms == 0 {
            return Err(format!("{}: window_ms must be positive", key));
        }
        if let Some(max_cost) = self.max_cost {
            if !max_cost.is_finite() || max_cost <= 0.0 {
                return Err(format!("{}: max_cost must be a positive number", key));
            }
        }
        Ok(())
    }
}

/// Background sweep settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MaintenanceConfig {
    /// How often expired windows and stale breakers are swept
    pub sweep_interval_ms: u64,
    /// Breakers without a failure for this long are evicted
    pub retention_ms: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: 300_000,
            retention_ms: 86_400_000,
        }
    }
}

impl MaintenanceConfig {
    /// Sweep interval as a `Duration`.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Breaker retention as a `Duration`.
    pub fn retention(&self) -> Duration {
        Duration::from_millis(self.retention_ms)
    }
}

/// Provider selection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrchestratorConfig {
    /// How long a provider availability probe result is trusted
    pub availability_ttl_ms: u64,
    /// Default provider order per capability, keyed by capability name
    pub preferences: HashMap<String, Vec<String>>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let openai_first = vec!["openai".to_string(), "gemini".to_string()];
        let gemini_first = vec!["gemini".to_string(), "openai".to_string()];
        let preferences = [
            (Capability::Conversation, openai_first.clone()),
            (Capability::Translation, gemini_first),
            (Capability::GrammarCheck, openai_first.clone()),
            (Capability::SpeechSynthesis, openai_first.clone()),
            (Capability::Transcription, openai_first),
        ]
        .into_iter()
        .map(|(capability, order)| (capability.to_string(), order))
        .collect();

        Self {
            availability_ttl_ms: 300_000,
            preferences,
        }
    }
}

impl OrchestratorConfig {
    /// Availability cache TTL as a `Duration`.
    pub fn availability_ttl(&self) -> Duration {
        Duration::from_millis(self.availability_ttl_ms)
    }

    /// Default provider order for a capability (empty if unconfigured).
    pub fn order_for(&self, capability: Capability) -> &[String] {
        self.preferences
            .get(capability.as_ref())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Top-level Parley configuration.
///
/// # Example
///
/// ```no_run
/// use parley_rate_limit::ParleyConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ParleyConfig::load()?;
/// let limit = config.endpoint_limit("openai", "conversation");
/// println!("OpenAI conversation limit: {:?}", limit.map(|l| l.max_requests));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    /// Default retry policy
    pub retry: RetryConfig,
    /// Default circuit breaker thresholds
    pub circuit_breaker: CircuitBreakerConfig,
    /// Background sweep settings
    pub maintenance: MaintenanceConfig,
    /// Limits keyed by provider, then endpoint
    pub rate_limits: HashMap<String, HashMap<String, EndpointLimit>>,
    /// Provider selection settings
    pub orchestrator: OrchestratorConfig,
}

impl ParleyConfig {
    /// Load configuration from a specific file path.
    ///
    /// Sections missing from the file take their built-in defaults; the
    /// bundled `parley.toml` is not consulted.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> ParleyResult<Self> {
        debug!("Loading configuration from file");

        let config: Self = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                ParleyError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                ParleyError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with precedence: current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file is malformed or fails validation.
    #[instrument]
    pub fn load() -> ParleyResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../parley.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/parley/parley.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("parley").required(false));

        let config: Self = builder
            .build()
            .map_err(|e| {
                ParleyError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                ParleyError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Check every section for values the runtime cannot honour.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, naming the offending section.
    pub fn validate(&self) -> ParleyResult<()> {
        self.retry
            .validate()
            .map_err(|e| ConfigError::new(format!("[retry] {}", e)))?;
        self.circuit_breaker
            .validate()
            .map_err(|e| ConfigError::new(format!("[circuit_breaker] {}", e)))?;

        if self.maintenance.sweep_interval_ms == 0 {
            return Err(ConfigError::new("[maintenance] sweep_interval_ms must be positive").into());
        }

        for (provider, endpoints) in &self.rate_limits {
            for (endpoint, limit) in endpoints {
                limit
                    .validate(&format!("[rate_limits.{}.{}]", provider, endpoint))
                    .map_err(ConfigError::new)?;
            }
        }

        for (capability, order) in &self.orchestrator.preferences {
            if capability.parse::<Capability>().is_err() {
                return Err(ConfigError::new(format!(
                    "[orchestrator.preferences] unknown capability '{}'",
                    capability
                ))
                .into());
            }
            if order.is_empty() {
                return Err(ConfigError::new(format!(
                    "[orchestrator.preferences] '{}' lists no providers",
                    capability
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Limit configured for a provider endpoint, if any.
    pub fn endpoint_limit(&self, provider: &str, endpoint: &str) -> Option<&EndpointLimit> {
        self.rate_limits.get(provider)?.get(endpoint)
    }

    /// Flatten the nested table into service keys.
    pub fn endpoint_limits(&self) -> HashMap<ServiceKey, EndpointLimit> {
        self.rate_limits
            .iter()
            .flat_map(|(provider, endpoints)| {
                endpoints
                    .iter()
                    .map(move |(endpoint, limit)| (ServiceKey::new(provider, endpoint), limit.clone()))
            })
            .collect()
    }

    /// Build a rate limiter from the configured limits.
    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::from_config(self)
    }
}
