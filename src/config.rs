use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;
const CONFIG_DIR: &str = "config";

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_event_buffer_size() -> usize {
    DEFAULT_EVENT_BUFFER_SIZE
}

/// Application configuration, layered from `config/default.toml`, an optional
/// per-environment file, and `APP__`-prefixed environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Log filter directive passed to the tracing subscriber.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Capacity of the application event channel.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
            event_buffer_size: default_event_buffer_size(),
        }
    }
}

impl AppConfig {
    /// Loads configuration files and environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let default_path = Path::new(CONFIG_DIR).join("default");
        let env_path = Path::new(CONFIG_DIR).join(&env);

        let settings = Config::builder()
            .add_source(File::from(default_path).required(false))
            .add_source(File::from(env_path).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        if config.event_buffer_size == 0 {
            return Err(ConfigError::Message(
                "event_buffer_size must be at least 1".to_string(),
            ));
        }
        info!(environment = %config.environment, "Configuration loaded");
        Ok(config)
    }
}
