//! Transport traits
//!
//! Both legs of a call are text-framed websockets, but of different flavours
//! (an accepted axum socket on the telephony side, a tungstenite client on the
//! agent side). The relay only needs these two seams.

use async_trait::async_trait;

use crate::Result;

/// Read half of a text-framed connection
#[async_trait]
pub trait FrameSource: Send {
    /// Next text frame.
    ///
    /// Returns `None` once the peer has closed the connection. Control frames
    /// (ping/pong) are handled by the implementation and never surface here.
    async fn next_frame(&mut self) -> Option<Result<String>>;
}

/// Write half of a text-framed connection
#[async_trait]
pub trait FrameSink: Send {
    async fn send_frame(&mut self, text: String) -> Result<()>;

    /// Close the connection. Implementations must tolerate repeated calls.
    async fn close(&mut self) -> Result<()>;
}
