//! Media-stream WebSocket
//!
//! Accepts the telephony provider's media stream and hands it to a relay
//! supervisor for the lifetime of the call.

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};

use voice_relay_bridge::CallSummary;
use voice_relay_core::{Error, FrameSink, FrameSource, Result};

use crate::state::AppState;
use crate::ServerError;

/// WebSocket handler
pub struct MediaStreamHandler;

impl MediaStreamHandler {
    /// Handle WebSocket upgrade
    pub async fn handle(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
        ws.on_upgrade(move |socket| Self::handle_socket(socket, state))
    }

    async fn handle_socket(socket: WebSocket, state: AppState) {
        match Self::relay(socket, &state).await {
            Ok(summary) => tracing::info!(
                call_id = %summary.call_id,
                stream_sid = ?summary.stream_sid,
                call_sid = ?summary.call_sid,
                ended_by = %summary.ended_by,
                reason = %summary.exit,
                duration_ms = summary.duration_ms,
                media_frames = summary.stats.media_frames_forwarded,
                agent_chunks = summary.stats.agent_chunks_forwarded,
                marks = summary.stats.marks_acknowledged,
                barge_ins = summary.stats.barge_ins,
                malformed = summary.stats.malformed_frames,
                "Call ended"
            ),
            Err(e) => tracing::error!(error = %e, "Call could not be relayed"),
        }
    }

    async fn relay(socket: WebSocket, state: &AppState) -> std::result::Result<CallSummary, ServerError> {
        let (sender, receiver) = socket.split();
        let summary = state
            .supervisor()
            .run(
                Box::new(TelephonySource { inner: receiver }),
                Box::new(TelephonySink { inner: sender }),
            )
            .await?;
        Ok(summary)
    }
}

struct TelephonySource {
    inner: SplitStream<WebSocket>,
}

#[async_trait]
impl FrameSource for TelephonySource {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        loop {
            match self.inner.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(data)) => {
                    return Some(String::from_utf8(data).map_err(|_| {
                        Error::MalformedFrame("binary frame is not UTF-8".into())
                    }))
                }
                Ok(Message::Close(_)) => return None,
                Ok(Message::Ping(_) | Message::Pong(_)) => continue,
                Err(e) => return Some(Err(Error::Transport(e.to_string()))),
            }
        }
    }
}

struct TelephonySink {
    inner: SplitSink<WebSocket, Message>,
}

#[async_trait]
impl FrameSink for TelephonySink {
    async fn send_frame(&mut self, text: String) -> Result<()> {
        self.inner
            .send(Message::Text(text))
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        self.inner
            .close()
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }
}
