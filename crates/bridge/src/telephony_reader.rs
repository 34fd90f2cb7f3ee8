//! Telephony inbound reader
//!
//! Consumes the media stream from the telephony provider: records the stream
//! identity, forwards caller audio to the agent, and retires playback marks.

use async_trait::async_trait;
use parking_lot::Mutex;

use voice_relay_core::{
    AgentCommand, AudioFormat, CallSession, FrameSource, Result, TelephonyEvent,
};

use crate::reader::{self, Flow, FrameHandler, ReaderExit};
use crate::Link;

pub struct TelephonyReader<'a> {
    session: &'a Mutex<CallSession>,
    agent: &'a Link,
    audio_format: AudioFormat,
}

impl<'a> TelephonyReader<'a> {
    pub fn new(session: &'a Mutex<CallSession>, agent: &'a Link, audio_format: AudioFormat) -> Self {
        Self {
            session,
            agent,
            audio_format,
        }
    }

    /// Read until the telephony side goes away, then close the agent leg
    pub async fn run(&self, source: &mut dyn FrameSource) -> ReaderExit {
        let exit = reader::drive(self, source).await;
        if self.agent.close().await {
            tracing::info!(reason = %exit, "Closed agent connection after telephony ended");
        }
        exit
    }

    fn on_start(&self, start: voice_relay_core::StreamStart) {
        let encoding = start.media_format.as_ref().map(|f| f.encoding.clone());
        if let Some(encoding) = encoding.as_deref() {
            if !self.audio_format.matches_telephony_encoding(encoding) {
                tracing::warn!(
                    encoding,
                    expected = self.audio_format.telephony_encoding(),
                    "Telephony stream encoding does not match the agent audio format"
                );
            }
        }

        tracing::info!(
            stream_sid = %start.stream_sid,
            call_sid = ?start.call_sid,
            encoding = ?encoding,
            "Incoming stream has started"
        );
        self.session
            .lock()
            .start_stream(start.stream_sid, start.call_sid);
    }
}

#[async_trait]
impl FrameHandler for TelephonyReader<'_> {
    fn side(&self) -> &'static str {
        "telephony"
    }

    fn session(&self) -> &Mutex<CallSession> {
        self.session
    }

    async fn handle_frame(&self, text: &str) -> Result<Flow> {
        match TelephonyEvent::parse(text)? {
            TelephonyEvent::Connected { protocol } => {
                tracing::debug!(protocol = ?protocol, "Telephony stream connected");
            }
            TelephonyEvent::Start { start } => self.on_start(start),
            TelephonyEvent::Media { media } => {
                self.session.lock().record_media_timestamp(media.timestamp);
                if !self.agent.is_open() {
                    tracing::trace!("Agent not connected, dropping caller audio");
                    return Ok(Flow::Continue);
                }
                self.agent
                    .send(&AgentCommand::append_audio(media.payload))
                    .await?;
                self.session.lock().note_media_forwarded();
            }
            TelephonyEvent::Mark { mark } => {
                let acknowledged = self.session.lock().acknowledge_mark();
                tracing::trace!(
                    mark = ?mark.map(|m| m.name),
                    matched = acknowledged.is_some(),
                    "Playback mark acknowledged"
                );
            }
            TelephonyEvent::Stop { .. } => {
                tracing::info!("Telephony stream stopped");
                return Ok(Flow::Stop);
            }
            TelephonyEvent::Unknown => {
                tracing::trace!("Ignoring telephony event");
            }
        }
        Ok(Flow::Continue)
    }
}
