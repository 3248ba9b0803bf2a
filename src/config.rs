use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::models::ScoringWeights;
use crate::services::agent::AgentConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub oracle: OracleSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub connections: ConnectionSettings,
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }

#[derive(Debug, Clone, Deserialize)]
pub struct OracleSettings {
    #[serde(default = "default_oracle_endpoint")]
    pub endpoint: String,
    pub api_key: Option<String>,
    #[serde(default = "default_oracle_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            endpoint: default_oracle_endpoint(),
            api_key: None,
            model: default_oracle_model(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl OracleSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

fn default_oracle_endpoint() -> String { crate::services::oracle::OPENAI_ENDPOINT.to_string() }
fn default_oracle_model() -> String { crate::services::oracle::DEFAULT_MODEL.to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_max_retries() -> u32 { 2 }
fn default_retry_backoff_ms() -> u64 { 500 }

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_brave_endpoint")]
    pub brave_endpoint: String,
    pub brave_api_key: Option<String>,
    #[serde(default = "default_duckduckgo_endpoint")]
    pub duckduckgo_endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            brave_endpoint: default_brave_endpoint(),
            brave_api_key: None,
            duckduckgo_endpoint: default_duckduckgo_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SearchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_brave_endpoint() -> String { crate::services::search::BRAVE_ENDPOINT.to_string() }
fn default_duckduckgo_endpoint() -> String { crate::services::search::DUCKDUCKGO_ENDPOINT.to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: default_cache_ttl_secs() }
    }
}

fn default_cache_ttl_secs() -> u64 { 600 }

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionSettings {
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_max_connections() -> usize { 100 }
fn default_idle_timeout_secs() -> u64 { 1800 }
fn default_sweep_interval_secs() -> u64 { 60 }

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            max_history: default_max_history(),
            recommendation_limit: default_recommendation_limit(),
        }
    }
}

fn default_history_window() -> usize { 4 }
fn default_max_history() -> usize { 10 }
fn default_recommendation_limit() -> usize { crate::core::matcher::DEFAULT_RECOMMENDATION_LIMIT }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_academic_weight")]
    pub academic: f64,
    #[serde(default = "default_major_weight")]
    pub major: f64,
    #[serde(default = "default_location_weight")]
    pub location: f64,
    #[serde(default = "default_affordability_weight")]
    pub affordability: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            academic: default_academic_weight(),
            major: default_major_weight(),
            location: default_location_weight(),
            affordability: default_affordability_weight(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        Self {
            academic: config.academic,
            major: config.major,
            location: config.location,
            affordability: config.affordability,
        }
    }
}

fn default_academic_weight() -> f64 { 0.4 }
fn default_major_weight() -> f64 { 0.3 }
fn default_location_weight() -> f64 { 0.2 }
fn default_affordability_weight() -> f64 { 0.1 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml, then config/local.toml)
    /// 3. Environment variables (prefixed with UNIGUIDE__)
    /// 4. Credential shortcuts (OPENAI_API_KEY, BRAVE_API_KEY, PORT)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., UNIGUIDE__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        let settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let has_oracle_key = self
            .oracle
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if !has_oracle_key {
            return Err(ConfigError::Message(
                "oracle.api_key is required (set OPENAI_API_KEY)".to_string(),
            ));
        }

        let weights = &self.scoring.weights;
        let all = [weights.academic, weights.major, weights.location, weights.affordability];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) || all.iter().sum::<f64>() <= 0.0 {
            return Err(ConfigError::Message(
                "scoring weights must be non-negative with a positive sum".to_string(),
            ));
        }

        if self.connections.max_connections == 0 {
            return Err(ConfigError::Message("connections.max_connections must be positive".to_string()));
        }

        Ok(())
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            history_window: self.agent.history_window,
            max_history: self.agent.max_history,
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix("UNIGUIDE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Apply the conventional credential variables on top of the layered config
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let non_empty = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

    let mut builder = Config::builder().add_source(settings);

    if let Some(api_key) = non_empty("OPENAI_API_KEY") {
        builder = builder.set_override("oracle.api_key", api_key)?;
    }
    if let Some(api_key) = non_empty("BRAVE_API_KEY") {
        builder = builder.set_override("search.brave_api_key", api_key)?;
    }
    if let Some(port) = non_empty("PORT") {
        let port: u16 = port
            .parse()
            .map_err(|e| ConfigError::Message(format!("Invalid PORT '{}': {}", port, e)))?;
        builder = builder.set_override("server.port", i64::from(port))?;
    }

    builder.build()
}
