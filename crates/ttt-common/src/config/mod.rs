//! Configuration structs

mod client_config;

pub use client_config::{
    ApiConfig, AppSettings, ClientConfig, ClientTuning, ConfigError, Environment, GatewayConfig,
    LogConfig, StorageConfig,
};
