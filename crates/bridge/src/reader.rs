//! Read loop shared by both legs

use async_trait::async_trait;
use parking_lot::Mutex;

use voice_relay_core::{CallSession, Error, FrameSource, Result};

/// Why a reader stopped
#[derive(Debug)]
pub enum ReaderExit {
    /// The remote end closed the connection
    PeerClosed,
    /// Telephony announced the end of the stream
    StreamStopped,
    /// A read or write failed
    Failed(Error),
}

impl std::fmt::Display for ReaderExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReaderExit::PeerClosed => write!(f, "peer closed"),
            ReaderExit::StreamStopped => write!(f, "stream stopped"),
            ReaderExit::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// What to do after a frame was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Stop,
}

#[async_trait]
pub(crate) trait FrameHandler: Sync {
    /// Leg name, for logging
    fn side(&self) -> &'static str;

    fn session(&self) -> &Mutex<CallSession>;

    async fn handle_frame(&self, text: &str) -> Result<Flow>;
}

/// Feed frames to `handler` until the source ends, the handler stops, or a
/// terminal error occurs. Undecodable frames are counted and skipped.
pub(crate) async fn drive<H: FrameHandler>(
    handler: &H,
    source: &mut dyn FrameSource,
) -> ReaderExit {
    loop {
        let text = match source.next_frame().await {
            None => return ReaderExit::PeerClosed,
            Some(Ok(text)) => text,
            Some(Err(e)) => match skip_or_fail(handler, e) {
                Some(exit) => return exit,
                None => continue,
            },
        };

        match handler.handle_frame(&text).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Stop) => return ReaderExit::StreamStopped,
            Err(e) => {
                if let Some(exit) = skip_or_fail(handler, e) {
                    return exit;
                }
            }
        }
    }
}

fn skip_or_fail<H: FrameHandler>(handler: &H, error: Error) -> Option<ReaderExit> {
    if error.is_terminal() {
        return Some(ReaderExit::Failed(error));
    }
    handler.session().lock().note_malformed_frame();
    tracing::warn!(side = handler.side(), error = %error, "Dropping malformed frame");
    None
}
