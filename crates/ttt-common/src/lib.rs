//! # ttt-common
//!
//! Shared utilities including configuration, error handling, token
//! inspection, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{inspect_token, TokenClaims};
pub use config::{
    ApiConfig, AppSettings, ClientConfig, ClientTuning, ConfigError, Environment, GatewayConfig,
    LogConfig, StorageConfig,
};
pub use error::{AppError, AppResult, ErrorCategory};
pub use telemetry::{init_tracing, try_init_tracing, TracingConfig, TracingError};
