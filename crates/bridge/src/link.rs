//! Shared write side of a connection
//!
//! Both readers of a call may write to either leg, so each leg's sink lives
//! behind an async mutex together with an open flag that any side can flip.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::Mutex;

use voice_relay_core::{Error, FrameSink, Result};

/// One leg of a call, as seen by the writers
pub struct Link {
    name: &'static str,
    sink: Mutex<Box<dyn FrameSink>>,
    open: AtomicBool,
}

impl Link {
    pub fn new(name: &'static str, sink: Box<dyn FrameSink>) -> Self {
        Self {
            name,
            sink: Mutex::new(sink),
            open: AtomicBool::new(true),
        }
    }

    /// Whether sends are still attempted on this leg
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Serialize and send one message.
    ///
    /// A failed write marks the link closed; later sends return
    /// [`Error::ConnectionClosed`] without touching the socket.
    pub async fn send<T: Serialize + ?Sized>(&self, message: &T) -> Result<()> {
        if !self.is_open() {
            return Err(Error::ConnectionClosed(self.name.to_string()));
        }
        let text = serde_json::to_string(message)?;

        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.send_frame(text).await {
            self.open.store(false, Ordering::Release);
            return Err(e);
        }
        Ok(())
    }

    /// Close the leg. Returns `true` only for the call that actually closed it.
    pub async fn close(&self) -> bool {
        if !self.open.swap(false, Ordering::AcqRel) {
            return false;
        }
        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.close().await {
            tracing::debug!(link = self.name, error = %e, "Error while closing connection");
        }
        true
    }
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("name", &self.name)
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory;
    use serde_json::json;

    #[tokio::test]
    async fn test_send_and_close() {
        let (_source, sink, mut peer) = memory::connection(8);
        let link = Link::new("agent", Box::new(sink));

        link.send(&json!({"type": "response.create"})).await.unwrap();
        assert_eq!(
            peer.recv_json().await.unwrap(),
            json!({"type": "response.create"})
        );

        assert!(link.close().await);
        assert!(!link.close().await);
        assert!(!link.is_open());
        assert!(peer.is_closed());

        let err = link.send(&json!({})).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed(name) if name == "agent"));
    }

    #[tokio::test]
    async fn test_failed_write_closes_link() {
        let (_source, sink, peer) = memory::connection(8);
        let link = Link::new("telephony", Box::new(sink));
        drop(peer);

        assert!(link.send(&json!({"event": "clear"})).await.is_err());
        assert!(!link.is_open());
    }
}
