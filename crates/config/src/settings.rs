//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{self, endpoints, session};
use crate::{BargeInConfig, CallControlConfig, ConfigError, SessionProfile};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Listening address and route paths
    #[serde(default)]
    pub server: ServerConfig,

    /// Realtime agent endpoint and credential
    #[serde(default)]
    pub agent: AgentEndpointConfig,

    /// Conversational profile sent to the agent on connect
    #[serde(default)]
    pub session: SessionProfile,

    /// Call-control document content
    #[serde(default)]
    pub call: CallControlConfig,

    /// Barge-in policy
    #[serde(default)]
    pub barge_in: BargeInConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Apply the plain environment variables the service has always honoured.
    ///
    /// `OPENAI_API_KEY` only fills an unset key; `PORT` always wins.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key_missing = self
            .agent
            .api_key
            .as_deref()
            .map_or(true, |k| k.trim().is_empty());
        if key_missing {
            if let Some(key) = lookup(constants::API_KEY_VAR).filter(|k| !k.trim().is_empty()) {
                self.agent.api_key = Some(key);
            }
        }

        if let Some(port) = lookup(constants::PORT_VAR) {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: constants::PORT_VAR.to_string(),
                message: format!("Not a port number: {}", port),
            })?;
        }

        Ok(())
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_agent()?;
        self.validate_session()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        for (field, path) in [
            ("server.media_stream_path", &server.media_stream_path),
            ("server.call_control_path", &server.call_control_path),
        ] {
            if !path.starts_with('/') || path.len() < 2 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("Must be an absolute route path, got {:?}", path),
                });
            }
        }

        if server.media_stream_path == server.call_control_path {
            return Err(ConfigError::InvalidValue {
                field: "server.media_stream_path".to_string(),
                message: "Must differ from server.call_control_path".to_string(),
            });
        }

        Ok(())
    }

    fn validate_agent(&self) -> Result<(), ConfigError> {
        let agent = &self.agent;

        if agent.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(ConfigError::MissingField(format!(
                "agent.api_key (or {})",
                constants::API_KEY_VAR
            )));
        }

        if !(agent.url.starts_with("wss://") || agent.url.starts_with("ws://")) {
            return Err(ConfigError::InvalidValue {
                field: "agent.url".to_string(),
                message: format!("Must be a websocket URL, got {}", agent.url),
            });
        }

        if agent.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent.connect_timeout_ms".to_string(),
                message: "Timeout must be at least 1ms".to_string(),
            });
        }

        Ok(())
    }

    fn validate_session(&self) -> Result<(), ConfigError> {
        let profile = &self.session;

        if profile.voice.trim().is_empty() {
            return Err(ConfigError::MissingField("session.voice".to_string()));
        }

        if !(session::MIN_TEMPERATURE..=session::MAX_TEMPERATURE).contains(&profile.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "session.temperature".to_string(),
                message: format!(
                    "Must be between {} and {}, got {}",
                    session::MIN_TEMPERATURE,
                    session::MAX_TEMPERATURE,
                    profile.temperature
                ),
            });
        }

        if self.environment.is_production() && profile.instructions.trim().is_empty() {
            tracing::warn!("session.instructions is empty in production");
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Route the telephony provider opens its media stream on
    #[serde(default = "default_media_stream_path")]
    pub media_stream_path: String,

    /// Route answering incoming-call webhooks
    #[serde(default = "default_call_control_path")]
    pub call_control_path: String,

    /// Hostname put in the stream URL. Falls back to the request's Host header.
    #[serde(default)]
    pub public_host: Option<String>,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    10000
}
fn default_media_stream_path() -> String {
    "/media-stream".to_string()
}
fn default_call_control_path() -> String {
    "/incoming-call".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            media_stream_path: default_media_stream_path(),
            call_control_path: default_call_control_path(),
            public_host: None,
        }
    }
}

/// Realtime agent endpoint
#[derive(Clone, Serialize, Deserialize)]
pub struct AgentEndpointConfig {
    #[serde(default = "default_agent_url")]
    pub url: String,

    #[serde(default = "default_agent_model")]
    pub model: String,

    /// Bearer credential (set via VOICE_RELAY__AGENT__API_KEY or OPENAI_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// `OpenAI-Beta` header value; omitted when unset
    #[serde(default = "default_beta_header")]
    pub beta_header: Option<String>,

    /// Websocket handshake timeout
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl AgentEndpointConfig {
    /// Full websocket URL including the model query parameter
    pub fn endpoint_url(&self) -> String {
        if self.model.is_empty() || self.url.contains("model=") {
            return self.url.clone();
        }
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}model={}", self.url, separator, self.model)
    }
}

impl std::fmt::Debug for AgentEndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentEndpointConfig")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("beta_header", &self.beta_header)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .finish()
    }
}

fn default_agent_url() -> String {
    endpoints::REALTIME_URL.to_string()
}
fn default_agent_model() -> String {
    endpoints::REALTIME_MODEL.to_string()
}
fn default_beta_header() -> Option<String> {
    Some(endpoints::REALTIME_BETA.to_string())
}
fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl Default for AgentEndpointConfig {
    fn default() -> Self {
        Self {
            url: default_agent_url(),
            model: default_agent_model(),
            api_key: None,
            beta_header: default_beta_header(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. `PORT`, then `OPENAI_API_KEY` if no key was configured
/// 2. Environment variables (VOICE_RELAY__ prefix)
/// 3. config/{env}.yaml (if env specified)
/// 4. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix(constants::ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let mut settings: Settings = config.try_deserialize()?;

    settings.apply_env_overrides(|name| std::env::var(name).ok())?;
    settings.validate()?;

    Ok(settings)
}
