//! Core types for the telephony to realtime-agent relay
//!
//! This crate provides the foundational types shared by the other crates:
//! - Error types
//! - Audio format identifiers
//! - Telephony media-stream protocol (inbound events, outbound commands)
//! - Realtime agent protocol (inbound events, outbound commands)
//! - Per-call session record
//! - Transport traits implemented by the websocket adapters

pub mod audio;
pub mod error;
pub mod media_stream;
pub mod realtime;
pub mod session;
pub mod traits;

pub use audio::AudioFormat;
pub use error::{Error, Result};
pub use media_stream::{
    InboundMedia, MarkLabel, MediaFormat, StreamStart, TelephonyCommand, TelephonyEvent,
};
pub use realtime::{
    AgentCommand, AgentEvent, ContentPart, ConversationItem, ItemRole, Modality,
    RealtimeErrorDetail, SessionUpdate, TurnDetection,
};
pub use session::{CallSession, CallStats, Interruption};
pub use traits::{FrameSink, FrameSource};
