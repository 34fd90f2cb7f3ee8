//! Configuration management for the voice relay
//!
//! Supports loading configuration from:
//! - YAML/TOML files (`config/default`, `config/{env}`)
//! - Environment variables (VOICE_RELAY__ prefix, `__` separator)
//! - Plain `OPENAI_API_KEY` and `PORT` variables

pub mod constants;
pub mod profile;
pub mod settings;

pub use profile::{BargeInConfig, BargeInMode, CallControlConfig, SessionProfile};
pub use settings::{
    load_settings, AgentEndpointConfig, ObservabilityConfig, RuntimeEnvironment, ServerConfig,
    Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
