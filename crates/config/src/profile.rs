//! Conversational profile and call-handling policy

use serde::{Deserialize, Serialize};
use voice_relay_core::AudioFormat;

use crate::constants::session;

/// What the agent sounds like and how it is told to behave
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionProfile {
    /// Voice identity
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Spoken language hint (e.g. "ja"); omitted from the session when unset
    #[serde(default)]
    pub language: Option<String>,

    /// System instructions
    #[serde(default = "default_instructions")]
    pub instructions: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Audio encoding on both legs. Must match what telephony streams.
    #[serde(default)]
    pub audio_format: AudioFormat,

    /// Assistant-authored opening line used to prime the first turn
    #[serde(default)]
    pub greeting: Option<String>,
}

fn default_voice() -> String {
    session::DEFAULT_VOICE.to_string()
}

fn default_instructions() -> String {
    "You are a helpful phone assistant. Keep answers short and conversational.".to_string()
}

fn default_temperature() -> f32 {
    session::DEFAULT_TEMPERATURE
}

impl Default for SessionProfile {
    fn default() -> Self {
        Self {
            voice: default_voice(),
            language: None,
            instructions: default_instructions(),
            temperature: default_temperature(),
            audio_format: AudioFormat::default(),
            greeting: None,
        }
    }
}

/// Content of the call-control document returned to the telephony provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallControlConfig {
    /// Silence before anything is said, in seconds
    #[serde(default = "default_pause_secs")]
    pub pause_secs: u32,

    /// Spoken by the provider before the stream connects
    #[serde(default)]
    pub announcement: Option<String>,

    /// Language attribute for the announcement (e.g. "ja-JP")
    #[serde(default)]
    pub announcement_language: Option<String>,
}

fn default_pause_secs() -> u32 {
    1
}

impl Default for CallControlConfig {
    fn default() -> Self {
        Self {
            pause_secs: default_pause_secs(),
            announcement: None,
            announcement_language: None,
        }
    }
}

/// How the relay reacts when the caller talks over the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BargeInMode {
    /// Flush playback and tell the agent how much of its item was heard
    #[default]
    Truncate,
    /// Flush playback and drop the rest of the item, agent is not told
    Clear,
    /// No frames to either side; buffered playback finishes, the rest of the item is dropped
    Disabled,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BargeInConfig {
    #[serde(default)]
    pub mode: BargeInMode,
}
