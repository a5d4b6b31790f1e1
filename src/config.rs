use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::{CostAssumptions, ScoringWeights};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub selection: SelectionSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            redis_url: default_redis_url(),
            ttl_secs: None,
            l1_cache_size: None,
        }
    }
}

fn default_redis_url() -> String { "redis://127.0.0.1:6379".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct SelectionSettings {
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            candidate_limit: default_candidate_limit(),
            store_timeout_secs: default_store_timeout_secs(),
        }
    }
}

fn default_candidate_limit() -> usize { crate::core::DEFAULT_CANDIDATE_LIMIT }
fn default_store_timeout_secs() -> u64 { 5 }

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default = "default_annual_run_hours")]
    pub annual_run_hours: f64,
    #[serde(default = "default_energy_price")]
    pub energy_price: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            weights: WeightsConfig::default(),
            annual_run_hours: default_annual_run_hours(),
            energy_price: default_energy_price(),
        }
    }
}

impl ScoringSettings {
    pub fn cost_assumptions(&self) -> CostAssumptions {
        CostAssumptions {
            annual_run_hours: self.annual_run_hours,
            energy_price: self.energy_price,
        }
    }
}

fn default_annual_run_hours() -> f64 { 8000.0 }
fn default_energy_price() -> f64 { 0.8 }

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_flow_margin_weight")]
    pub flow_margin: f64,
    #[serde(default = "default_head_margin_weight")]
    pub head_margin: f64,
    #[serde(default = "default_efficiency_weight")]
    pub efficiency: f64,
    #[serde(default = "default_bep_match_weight")]
    pub bep_match: f64,
    #[serde(default = "default_power_margin_weight")]
    pub power_margin: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            flow_margin: default_flow_margin_weight(),
            head_margin: default_head_margin_weight(),
            efficiency: default_efficiency_weight(),
            bep_match: default_bep_match_weight(),
            power_margin: default_power_margin_weight(),
        }
    }
}

impl WeightsConfig {
    /// Reject weights that could push a composite score out of 0-100 or to NaN
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("flow_margin", self.flow_margin),
            ("head_margin", self.head_margin),
            ("efficiency", self.efficiency),
            ("bep_match", self.bep_match),
            ("power_margin", self.power_margin),
        ];
        for (name, weight) in weights {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(ConfigError::Message(format!(
                    "scoring.weights.{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        Ok(())
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        ScoringWeights {
            flow_margin: config.flow_margin,
            head_margin: config.head_margin,
            efficiency: config.efficiency,
            bep_match: config.bep_match,
            power_margin: config.power_margin,
        }
    }
}

fn default_flow_margin_weight() -> f64 { 0.2 }
fn default_head_margin_weight() -> f64 { 0.2 }
fn default_efficiency_weight() -> f64 { 0.3 }
fn default_bep_match_weight() -> f64 { 0.2 }
fn default_power_margin_weight() -> f64 { 0.1 }

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
fn default_log_format() -> String { "full".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with PUMP_SELECT_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., PUMP_SELECT__SELECTION__CANDIDATE_LIMIT -> selection.candidate_limit
            .add_source(
                Environment::with_prefix("PUMP_SELECT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = apply_database_url(settings)?;

        Self::from_config(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("PUMP_SELECT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_config(settings)
    }

    /// Deserialize and sanity-check a built configuration
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings.scoring.weights.validate()?;
        Ok(settings)
    }

    pub fn scoring_weights(&self) -> ScoringWeights {
        ScoringWeights::from(&self.scoring.weights)
    }
}

/// Let the conventional DATABASE_URL win over file settings
fn apply_database_url(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        Err(_) => Ok(settings),
    }
}
