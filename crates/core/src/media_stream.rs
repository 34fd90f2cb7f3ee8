//! Telephony media-stream protocol
//!
//! Text-framed JSON messages exchanged with the telephony provider over the
//! media-stream websocket. Every message carries an `event` discriminator.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

/// Inbound telephony event
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyEvent {
    /// Socket handshake acknowledgment, sent once before `start`
    Connected {
        #[serde(default)]
        protocol: Option<String>,
    },
    /// Stream metadata, including the stream sid every outbound frame must carry
    Start { start: StreamStart },
    /// One chunk of caller audio
    Media { media: InboundMedia },
    /// Playback acknowledgment for a mark we sent earlier
    Mark {
        #[serde(default)]
        mark: Option<MarkLabel>,
    },
    /// The provider is ending the stream
    Stop {
        #[serde(default)]
        stop: Option<serde_json::Value>,
    },
    /// Any event type the relay does not act on
    #[serde(other)]
    Unknown,
}

impl TelephonyEvent {
    /// Decode one text frame
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::MalformedFrame(e.to_string()))
    }

    /// Event name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            TelephonyEvent::Connected { .. } => "connected",
            TelephonyEvent::Start { .. } => "start",
            TelephonyEvent::Media { .. } => "media",
            TelephonyEvent::Mark { .. } => "mark",
            TelephonyEvent::Stop { .. } => "stop",
            TelephonyEvent::Unknown => "unknown",
        }
    }
}

/// Payload of the `start` event
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStart {
    pub stream_sid: String,
    #[serde(default)]
    pub call_sid: Option<String>,
    #[serde(default)]
    pub media_format: Option<MediaFormat>,
    #[serde(default)]
    pub custom_parameters: HashMap<String, String>,
}

/// Audio format announced by the provider
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFormat {
    pub encoding: String,
    #[serde(default)]
    pub sample_rate: Option<u32>,
    #[serde(default)]
    pub channels: Option<u32>,
}

/// Payload of an inbound `media` event
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundMedia {
    /// Base64 audio, passed through untouched
    pub payload: String,
    /// Milliseconds since the stream started. Sent as a numeric string by
    /// the provider; plain numbers are accepted too.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub timestamp: u64,
    #[serde(default)]
    pub track: Option<String>,
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Named mark, used in both directions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkLabel {
    pub name: String,
}

/// Outbound media payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMedia {
    pub payload: String,
}

/// Outbound telephony frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyCommand {
    /// Agent audio for playback to the caller
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: OutboundMedia,
    },
    /// Ask the provider to echo `name` back once preceding audio has played
    Mark {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        mark: MarkLabel,
    },
    /// Drop any audio buffered for playback
    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

impl TelephonyCommand {
    pub fn media(stream_sid: impl Into<String>, payload: impl Into<String>) -> Self {
        TelephonyCommand::Media {
            stream_sid: stream_sid.into(),
            media: OutboundMedia {
                payload: payload.into(),
            },
        }
    }

    pub fn mark(stream_sid: impl Into<String>, name: impl Into<String>) -> Self {
        TelephonyCommand::Mark {
            stream_sid: stream_sid.into(),
            mark: MarkLabel { name: name.into() },
        }
    }

    pub fn clear(stream_sid: impl Into<String>) -> Self {
        TelephonyCommand::Clear {
            stream_sid: stream_sid.into(),
        }
    }
}
