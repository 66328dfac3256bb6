use crate::core::ingest::{TextEncoding, DEFAULT_ENCODINGS};
use crate::models::{PenaltyWeights, VulnerabilityWeights};
use crate::services::{DEFAULT_ROUTING_ENDPOINT, PLACEHOLDER_API_KEY};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub dataset: DatasetSettings,
    #[serde(default)]
    pub ranking: RankingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub routing: RoutingSettings,
    #[serde(default)]
    pub feedback: FeedbackSettings,
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
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetSettings {
    #[serde(default = "default_dataset_path")]
    pub path: String,
    #[serde(default = "default_encodings")]
    pub encodings: Vec<TextEncoding>,
    #[serde(default = "default_true")]
    pub seed_sample: bool,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
            encodings: default_encodings(),
            seed_sample: true,
        }
    }
}

fn default_dataset_path() -> String { "data/hospitals.csv".to_string() }
fn default_encodings() -> Vec<TextEncoding> { DEFAULT_ENCODINGS.to_vec() }
fn default_true() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct RankingSettings {
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,
    #[serde(default = "default_max_top_n")]
    pub max_top_n: usize,
    /// Largest accepted upload body, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            default_top_n: default_top_n(),
            max_top_n: default_max_top_n(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_top_n() -> usize { 5 }
fn default_max_top_n() -> usize { 100 }
fn default_max_upload_bytes() -> usize { 10 * 1024 * 1024 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub penalties: PenaltiesConfig,
    #[serde(default)]
    pub vulnerability: VulnerabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PenaltiesConfig {
    #[serde(default = "default_not_accepting_penalty")]
    pub not_accepting: f64,
    #[serde(default = "default_missing_resource_penalty")]
    pub missing_resource: f64,
    #[serde(default = "default_waiting_weight")]
    pub waiting_weight: f64,
}

impl Default for PenaltiesConfig {
    fn default() -> Self {
        Self {
            not_accepting: default_not_accepting_penalty(),
            missing_resource: default_missing_resource_penalty(),
            waiting_weight: default_waiting_weight(),
        }
    }
}

impl From<&PenaltiesConfig> for PenaltyWeights {
    fn from(config: &PenaltiesConfig) -> Self {
        Self {
            not_accepting: config.not_accepting,
            missing_resource: config.missing_resource,
            waiting_weight: config.waiting_weight,
        }
    }
}

fn default_not_accepting_penalty() -> f64 { 1000.0 }
fn default_missing_resource_penalty() -> f64 { 20.0 }
fn default_waiting_weight() -> f64 { 2.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct VulnerabilityConfig {
    #[serde(default = "default_vulnerability_not_accepting")]
    pub not_accepting: f64,
    #[serde(default = "default_vulnerability_rating_gap")]
    pub rating_gap: f64,
    #[serde(default = "default_missing_resource_penalty")]
    pub missing_resource: f64,
    #[serde(default = "default_waiting_weight")]
    pub waiting_weight: f64,
}

impl Default for VulnerabilityConfig {
    fn default() -> Self {
        Self {
            not_accepting: default_vulnerability_not_accepting(),
            rating_gap: default_vulnerability_rating_gap(),
            missing_resource: default_missing_resource_penalty(),
            waiting_weight: default_waiting_weight(),
        }
    }
}

impl From<&VulnerabilityConfig> for VulnerabilityWeights {
    fn from(config: &VulnerabilityConfig) -> Self {
        Self {
            not_accepting: config.not_accepting,
            rating_gap: config.rating_gap,
            missing_resource: config.missing_resource,
            waiting_weight: config.waiting_weight,
        }
    }
}

fn default_vulnerability_not_accepting() -> f64 { 50.0 }
fn default_vulnerability_rating_gap() -> f64 { 5.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingSettings {
    #[serde(default = "default_routing_endpoint")]
    pub endpoint: String,
    pub api_key: Option<String>,
    #[serde(default = "default_routing_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_route_cache_size")]
    pub cache_size: u64,
    #[serde(default = "default_route_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            endpoint: default_routing_endpoint(),
            api_key: None,
            timeout_secs: default_routing_timeout(),
            cache_size: default_route_cache_size(),
            cache_ttl_secs: default_route_cache_ttl(),
        }
    }
}

fn default_routing_endpoint() -> String { DEFAULT_ROUTING_ENDPOINT.to_string() }
fn default_routing_timeout() -> u64 { 5 }
fn default_route_cache_size() -> u64 { 1000 }
fn default_route_cache_ttl() -> u64 { 600 }

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackSettings {
    #[serde(default = "default_feedback_url")]
    pub database_url: String,
    pub max_connections: Option<u32>,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            database_url: default_feedback_url(),
            max_connections: None,
        }
    }
}

fn default_feedback_url() -> String { "sqlite://hospital_feedback.db".to_string() }

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
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with OBMATCH_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., OBMATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("OBMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("OBMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that would break ranking invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        let penalties = &self.scoring.penalties;
        let weights = [
            ("scoring.penalties.not_accepting", penalties.not_accepting),
            ("scoring.penalties.missing_resource", penalties.missing_resource),
            ("scoring.penalties.waiting_weight", penalties.waiting_weight),
        ];
        for (key, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Message(format!(
                    "{} must be a non-negative number, got {}",
                    key, value
                )));
            }
        }

        if self.ranking.max_top_n == 0 {
            return Err(ConfigError::Message("ranking.max_top_n must be at least 1".into()));
        }
        if self.dataset.encodings.is_empty() {
            return Err(ConfigError::Message("dataset.encodings must not be empty".into()));
        }

        Ok(())
    }

    /// Routing key, ignoring the sample placeholder
    pub fn routing_api_key(&self) -> Option<String> {
        self.routing
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty() && k != PLACEHOLDER_API_KEY)
    }
}

/// Apply the conventional, unprefixed environment variables
///
/// `ORS_API_KEY` sets the routing key and `FEEDBACK_DATABASE_URL` the
/// feedback database, taking precedence over files and prefixed variables.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(api_key) = env::var("ORS_API_KEY") {
        builder = builder.set_override("routing.api_key", api_key)?;
    }
    if let Ok(database_url) = env::var("FEEDBACK_DATABASE_URL") {
        builder = builder.set_override("feedback.database_url", database_url)?;
    }

    builder.build()
}
