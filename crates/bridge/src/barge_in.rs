//! Barge-in handling
//!
//! When the caller starts speaking over the agent, the agent's queued audio
//! is flushed from telephony playback and, in `truncate` mode, the agent is
//! told how much of its item the caller actually heard. With barge-in
//! disabled no frames go out but the rest of the item is still dropped.

use parking_lot::Mutex;

use voice_relay_config::BargeInMode;
use voice_relay_core::{AgentCommand, CallSession, Interruption, Result, TelephonyCommand};

use crate::Link;

#[derive(Debug, Clone, Copy, Default)]
pub struct BargeInController {
    mode: BargeInMode,
}

impl BargeInController {
    pub fn new(mode: BargeInMode) -> Self {
        Self { mode }
    }

    /// React to caller speech.
    ///
    /// Returns the interruption that was applied, or `None` if nothing was
    /// playing. Session state is cleared in every mode; `disabled` only skips
    /// the frames.
    pub async fn on_caller_speech(
        &self,
        session: &Mutex<CallSession>,
        agent: &Link,
        telephony: &Link,
    ) -> Result<Option<Interruption>> {
        let (interruption, stream_sid) = {
            let mut session = session.lock();
            let interruption = session.interrupt();
            (interruption, session.stream_sid().map(str::to_owned))
        };
        let Some(interruption) = interruption else {
            return Ok(None);
        };

        tracing::info!(
            item_id = %interruption.item_id,
            audio_end_ms = interruption.audio_end_ms,
            unplayed_marks = interruption.unplayed_marks,
            mode = ?self.mode,
            "Caller barged in"
        );

        if self.mode == BargeInMode::Disabled {
            return Ok(Some(interruption));
        }

        if let Some(stream_sid) = stream_sid {
            telephony.send(&TelephonyCommand::clear(stream_sid)).await?;
        }

        if self.mode == BargeInMode::Truncate && agent.is_open() {
            agent
                .send(&AgentCommand::truncate(
                    interruption.item_id.as_str(),
                    interruption.audio_end_ms,
                ))
                .await?;
        }

        Ok(Some(interruption))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory;
    use crate::memory::RemotePeer;
    use serde_json::json;

    struct Harness {
        session: Mutex<CallSession>,
        agent: Link,
        agent_peer: RemotePeer,
        telephony: Link,
        telephony_peer: RemotePeer,
    }

    fn harness() -> Harness {
        let (_, agent_sink, agent_peer) = memory::connection(8);
        let (_, telephony_sink, telephony_peer) = memory::connection(8);

        let mut session = CallSession::new("call-1");
        session.start_stream("SS1", None);
        session.record_media_timestamp(1000);
        session.record_agent_chunk(Some("item1"), 1000);
        session.push_mark("responsePart");
        session.record_media_timestamp(1480);

        Harness {
            session: Mutex::new(session),
            agent: Link::new("agent", Box::new(agent_sink)),
            agent_peer,
            telephony: Link::new("telephony", Box::new(telephony_sink)),
            telephony_peer,
        }
    }

    #[tokio::test]
    async fn test_truncate_mode() {
        let mut h = harness();
        let controller = BargeInController::new(BargeInMode::Truncate);

        let interruption = controller
            .on_caller_speech(&h.session, &h.agent, &h.telephony)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(interruption.audio_end_ms, 480);

        assert_eq!(
            h.telephony_peer.recv_json().await.unwrap(),
            json!({"event": "clear", "streamSid": "SS1"})
        );
        assert_eq!(
            h.agent_peer.recv_json().await.unwrap(),
            json!({
                "type": "conversation.item.truncate",
                "item_id": "item1",
                "content_index": 0,
                "audio_end_ms": 480
            })
        );

        let session = h.session.lock();
        assert!(session.last_assistant_item().is_none());
        assert_eq!(session.pending_marks(), 0);
    }

    #[tokio::test]
    async fn test_clear_mode_leaves_agent_alone() {
        let mut h = harness();
        let controller = BargeInController::new(BargeInMode::Clear);

        controller
            .on_caller_speech(&h.session, &h.agent, &h.telephony)
            .await
            .unwrap();

        assert_eq!(h.telephony_peer.recv_json().await.unwrap()["event"], "clear");
        assert!(h.agent_peer.try_recv_json().is_none());
        assert!(h.session.lock().is_interrupted(Some("item1")));
    }

    #[tokio::test]
    async fn test_disabled_mode_sends_nothing_but_clears_state() {
        let mut h = harness();
        let controller = BargeInController::new(BargeInMode::Disabled);

        let interruption = controller
            .on_caller_speech(&h.session, &h.agent, &h.telephony)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(interruption.item_id, "item1");
        assert!(h.telephony_peer.try_recv_json().is_none());
        assert!(h.agent_peer.try_recv_json().is_none());

        let session = h.session.lock();
        assert!(session.last_assistant_item().is_none());
        assert_eq!(session.pending_marks(), 0);
        assert!(session.is_interrupted(Some("item1")));
    }

    #[tokio::test]
    async fn test_nothing_playing() {
        let mut h = harness();
        h.session.lock().interrupt();
        let controller = BargeInController::default();

        let result = controller
            .on_caller_speech(&h.session, &h.agent, &h.telephony)
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(h.telephony_peer.try_recv_json().is_none());
        assert!(h.agent_peer.try_recv_json().is_none());
    }
}
