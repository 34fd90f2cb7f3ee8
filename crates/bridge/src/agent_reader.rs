//! Agent inbound reader
//!
//! Consumes events from the agent: speech chunks go to telephony with a
//! playback mark after each, and caller speech triggers barge-in.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use parking_lot::Mutex;

use voice_relay_config::constants::RESPONSE_MARK;
use voice_relay_core::{
    AgentEvent, AudioFormat, CallSession, Error, FrameSource, Result, TelephonyCommand,
};

use crate::reader::{self, Flow, FrameHandler, ReaderExit};
use crate::{BargeInController, Link};

pub struct AgentReader<'a> {
    session: &'a Mutex<CallSession>,
    agent: &'a Link,
    telephony: &'a Link,
    barge_in: BargeInController,
    audio_format: AudioFormat,
}

impl<'a> AgentReader<'a> {
    pub fn new(
        session: &'a Mutex<CallSession>,
        agent: &'a Link,
        telephony: &'a Link,
        barge_in: BargeInController,
        audio_format: AudioFormat,
    ) -> Self {
        Self {
            session,
            agent,
            telephony,
            barge_in,
            audio_format,
        }
    }

    /// Read until the agent side goes away
    pub async fn run(&self, source: &mut dyn FrameSource) -> ReaderExit {
        reader::drive(self, source).await
    }

    async fn forward_audio(&self, delta: String, item_id: Option<String>) -> Result<()> {
        let (stream_sid, suppressed) = {
            let session = self.session.lock();
            (
                session.stream_sid().map(str::to_owned),
                session.is_interrupted(item_id.as_deref()),
            )
        };

        if suppressed {
            tracing::trace!(item_id = ?item_id, "Dropping audio of interrupted item");
            return Ok(());
        }
        let Some(stream_sid) = stream_sid else {
            tracing::debug!("Stream not started yet, dropping agent audio");
            return Ok(());
        };

        let audio = BASE64
            .decode(delta.as_bytes())
            .map_err(|e| Error::MalformedFrame(format!("audio delta is not base64: {}", e)))?;
        let audio_ms = self.audio_format.duration_ms(audio.len());

        self.telephony
            .send(&TelephonyCommand::media(stream_sid.as_str(), BASE64.encode(&audio)))
            .await?;
        self.session
            .lock()
            .record_agent_chunk(item_id.as_deref(), audio_ms);

        self.telephony
            .send(&TelephonyCommand::mark(stream_sid, RESPONSE_MARK))
            .await?;
        self.session.lock().push_mark(RESPONSE_MARK);
        Ok(())
    }
}

#[async_trait]
impl FrameHandler for AgentReader<'_> {
    fn side(&self) -> &'static str {
        "agent"
    }

    fn session(&self) -> &Mutex<CallSession> {
        self.session
    }

    async fn handle_frame(&self, text: &str) -> Result<Flow> {
        let event = AgentEvent::parse(text)?;
        match event {
            AgentEvent::AudioDelta { delta, item_id, .. } => {
                self.forward_audio(delta, item_id).await?;
            }
            AgentEvent::SpeechStarted { audio_start_ms, .. } => {
                tracing::debug!(audio_start_ms = ?audio_start_ms, "Caller speech started");
                let speaking = self.session.lock().last_assistant_item().is_some();
                if speaking {
                    self.barge_in
                        .on_caller_speech(self.session, self.agent, self.telephony)
                        .await?;
                }
            }
            AgentEvent::SpeechStopped { audio_end_ms } => {
                tracing::debug!(audio_end_ms = ?audio_end_ms, "Caller speech stopped");
            }
            AgentEvent::SessionCreated { session } => {
                tracing::info!(
                    session_id = ?session.as_ref().and_then(|s| s.id.as_deref()),
                    model = ?session.as_ref().and_then(|s| s.model.as_deref()),
                    "Agent session created"
                );
            }
            AgentEvent::SessionUpdated { .. } => {
                tracing::debug!("Agent session updated");
            }
            AgentEvent::ResponseDone { response } => {
                tracing::debug!(
                    response_id = ?response.as_ref().and_then(|r| r.id.as_deref()),
                    status = ?response.as_ref().and_then(|r| r.status.as_deref()),
                    "Agent response done"
                );
            }
            AgentEvent::Error { error } => {
                tracing::warn!(
                    kind = ?error.kind,
                    code = ?error.code,
                    message = %error.message,
                    "Agent reported an error"
                );
            }
            AgentEvent::Other => {
                tracing::trace!("Ignoring agent event");
            }
        }
        Ok(Flow::Continue)
    }
}
