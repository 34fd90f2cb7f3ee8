//! Realtime agent protocol
//!
//! Text-framed JSON messages exchanged with the conversational agent endpoint.
//! Every message carries a `type` discriminator.

use serde::{Deserialize, Serialize};

use crate::AudioFormat;

/// Outbound message to the agent
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum AgentCommand {
    /// Configure voice, formats, instructions and turn detection
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionUpdate },

    /// Seed a conversation item (e.g. an opening greeting)
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate { item: ConversationItem },

    /// Ask the agent to start generating a response
    #[serde(rename = "response.create")]
    ResponseCreate,

    /// One chunk of caller audio
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend { audio: String },

    /// Tell the agent how much of an item the caller actually heard
    #[serde(rename = "conversation.item.truncate")]
    ConversationItemTruncate {
        item_id: String,
        content_index: u32,
        audio_end_ms: u64,
    },
}

impl AgentCommand {
    pub fn append_audio(audio: impl Into<String>) -> Self {
        AgentCommand::InputAudioBufferAppend {
            audio: audio.into(),
        }
    }

    pub fn truncate(item_id: impl Into<String>, audio_end_ms: u64) -> Self {
        AgentCommand::ConversationItemTruncate {
            item_id: item_id.into(),
            content_index: 0,
            audio_end_ms,
        }
    }

    /// Wire name, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            AgentCommand::SessionUpdate { .. } => "session.update",
            AgentCommand::ConversationItemCreate { .. } => "conversation.item.create",
            AgentCommand::ResponseCreate => "response.create",
            AgentCommand::InputAudioBufferAppend { .. } => "input_audio_buffer.append",
            AgentCommand::ConversationItemTruncate { .. } => "conversation.item.truncate",
        }
    }
}

/// Session parameters sent in `session.update`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUpdate {
    pub turn_detection: TurnDetection,
    pub input_audio_format: AudioFormat,
    pub output_audio_format: AudioFormat,
    pub voice: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub instructions: String,
    pub modalities: Vec<Modality>,
    pub temperature: f32,
}

/// Turn detection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnDetection {
    /// Voice-activity detection on the agent side
    ServerVad,
}

/// Response modality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Audio,
}

/// Conversation item author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemRole {
    Assistant,
}

/// A message item for `conversation.item.create`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub role: ItemRole,
    pub content: Vec<ContentPart>,
}

impl ConversationItem {
    /// Assistant-authored text message
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self {
            kind: "message".to_string(),
            role: ItemRole::Assistant,
            content: vec![ContentPart::Text { text: text.into() }],
        }
    }
}

/// Content of a message item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text authored by the assistant
    Text { text: String },
}

/// Inbound event from the agent
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum AgentEvent {
    #[serde(rename = "session.created")]
    SessionCreated {
        #[serde(default)]
        session: Option<SessionInfo>,
    },

    #[serde(rename = "session.updated")]
    SessionUpdated {
        #[serde(default)]
        session: Option<SessionInfo>,
    },

    /// Incremental chunk of synthesized speech, already in the telephony encoding
    #[serde(rename = "response.audio.delta")]
    AudioDelta {
        delta: String,
        #[serde(default)]
        item_id: Option<String>,
        #[serde(default)]
        response_id: Option<String>,
    },

    /// The agent's VAD heard the caller start talking
    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted {
        #[serde(default)]
        audio_start_ms: Option<u64>,
        #[serde(default)]
        item_id: Option<String>,
    },

    #[serde(rename = "input_audio_buffer.speech_stopped")]
    SpeechStopped {
        #[serde(default)]
        audio_end_ms: Option<u64>,
    },

    #[serde(rename = "response.done")]
    ResponseDone {
        #[serde(default)]
        response: Option<ResponseInfo>,
    },

    #[serde(rename = "error")]
    Error { error: RealtimeErrorDetail },

    /// Anything the relay leaves to the agent endpoint
    #[serde(other)]
    Other,
}

impl AgentEvent {
    /// Decode one text frame
    pub fn parse(text: &str) -> crate::Result<Self> {
        serde_json::from_str(text).map_err(|e| crate::Error::MalformedFrame(e.to_string()))
    }

    /// Wire name, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            AgentEvent::SessionCreated { .. } => "session.created",
            AgentEvent::SessionUpdated { .. } => "session.updated",
            AgentEvent::AudioDelta { .. } => "response.audio.delta",
            AgentEvent::SpeechStarted { .. } => "input_audio_buffer.speech_started",
            AgentEvent::SpeechStopped { .. } => "input_audio_buffer.speech_stopped",
            AgentEvent::ResponseDone { .. } => "response.done",
            AgentEvent::Error { .. } => "error",
            AgentEvent::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResponseInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Body of an agent `error` event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RealtimeErrorDetail {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}
