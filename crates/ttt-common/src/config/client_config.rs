//! Client configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when
//! present). Every value has a default suited to a backend on localhost.

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub app: AppSettings,
    pub api: ApiConfig,
    pub gateway: GatewayConfig,
    pub storage: StorageConfig,
    pub client: ClientTuning,
    pub log: LogConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// REST backend
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Absolute URL for an API path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Persistent connection endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_socket_url")]
    pub url: String,
}

/// Client-local persistence
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

/// Channel sizes and background refresh knobs
#[derive(Debug, Clone, Deserialize)]
pub struct ClientTuning {
    /// Capacity of the notification, request and outbound frame channels
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    #[serde(default = "default_leaderboard_limit")]
    pub leaderboard_limit: u32,
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

/// Logging
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

// Default value functions
fn default_app_name() -> String {
    "tictactoe-client".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_socket_url() -> String {
    "ws://localhost:8000/ws".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".tictactoe")
}

fn default_event_buffer() -> usize {
    100
}

fn default_leaderboard_limit() -> u32 {
    10
}

fn default_history_limit() -> u32 {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: default_env(),
            },
            api: ApiConfig {
                base_url: default_api_url(),
                request_timeout_secs: default_request_timeout(),
            },
            gateway: GatewayConfig {
                url: default_socket_url(),
            },
            storage: StorageConfig {
                dir: default_storage_dir(),
            },
            client: ClientTuning {
                event_buffer: default_event_buffer(),
                leaderboard_limit: default_leaderboard_limit(),
                history_limit: default_history_limit(),
            },
            log: LogConfig {
                level: default_log_level(),
                json: false,
            },
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparsable value
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("TTT_ENV") {
            Some(raw) => Environment::parse(&raw)
                .ok_or(ConfigError::InvalidValue("TTT_ENV", raw))?,
            None => default_env(),
        };

        let config = Self {
            app: AppSettings {
                name: lookup("TTT_APP_NAME").unwrap_or_else(default_app_name),
                env,
            },
            api: ApiConfig {
                base_url: lookup("TTT_API_URL").unwrap_or_else(default_api_url),
                request_timeout_secs: parse_var(&lookup, "TTT_REQUEST_TIMEOUT_SECS")?
                    .unwrap_or_else(default_request_timeout),
            },
            gateway: GatewayConfig {
                url: lookup("TTT_SOCKET_URL").unwrap_or_else(default_socket_url),
            },
            storage: StorageConfig {
                dir: lookup("TTT_STORAGE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_storage_dir),
            },
            client: ClientTuning {
                event_buffer: parse_var(&lookup, "TTT_EVENT_BUFFER")?
                    .unwrap_or_else(default_event_buffer),
                leaderboard_limit: parse_var(&lookup, "TTT_LEADERBOARD_LIMIT")?
                    .unwrap_or_else(default_leaderboard_limit),
                history_limit: parse_var(&lookup, "TTT_HISTORY_LIMIT")?
                    .unwrap_or_else(default_history_limit),
            },
            log: LogConfig {
                level: lookup("TTT_LOG_LEVEL").unwrap_or_else(default_log_level),
                json: parse_var(&lookup, "TTT_LOG_JSON")?.unwrap_or(env.is_production()),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue(
                "TTT_API_URL",
                self.api.base_url.clone(),
            ));
        }
        if !self.gateway.url.starts_with("ws://") && !self.gateway.url.starts_with("wss://") {
            return Err(ConfigError::InvalidValue(
                "TTT_SOCKET_URL",
                self.gateway.url.clone(),
            ));
        }
        if self.client.event_buffer == 0 {
            return Err(ConfigError::InvalidValue("TTT_EVENT_BUFFER", "0".to_string()));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .map(|raw| raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue(key, raw)))
        .transpose()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
