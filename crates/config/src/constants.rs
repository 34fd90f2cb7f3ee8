//! Protocol constants shared across crates

/// Environment variable prefix for layered settings
pub const ENV_PREFIX: &str = "VOICE_RELAY";

/// Selects `config/{env}.yaml`
pub const ENV_NAME_VAR: &str = "VOICE_RELAY_ENV";

/// Plain credential variable honoured for compatibility
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Plain listening-port variable honoured for compatibility
pub const PORT_VAR: &str = "PORT";

/// Name carried by every playback mark sent to telephony
pub const RESPONSE_MARK: &str = "responsePart";

pub mod endpoints {
    /// Realtime agent websocket endpoint
    pub const REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

    /// Realtime model requested on connect
    pub const REALTIME_MODEL: &str = "gpt-4o-realtime-preview-2024-10-01";

    /// Value of the `OpenAI-Beta` header
    pub const REALTIME_BETA: &str = "realtime=v1";
}

pub mod session {
    pub const DEFAULT_VOICE: &str = "alloy";

    pub const DEFAULT_TEMPERATURE: f32 = 0.8;

    /// Bounds accepted by the realtime endpoint
    pub const MIN_TEMPERATURE: f32 = 0.6;
    pub const MAX_TEMPERATURE: f32 = 1.2;
}
