//! In-process connection
//!
//! Channel-backed [`FrameSource`]/[`FrameSink`] pair with a handle for the
//! far end. Used to drive the relay without sockets.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use voice_relay_core::{Error, FrameSink, FrameSource, Result};

/// Create a connection whose far end is driven through the returned [`RemotePeer`]
pub fn connection(capacity: usize) -> (MemorySource, MemorySink, RemotePeer) {
    let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
    let (outbound_tx, outbound_rx) = mpsc::channel(capacity);
    let closed = Arc::new(AtomicBool::new(false));

    (
        MemorySource { rx: inbound_rx },
        MemorySink {
            tx: outbound_tx,
            closed: closed.clone(),
        },
        RemotePeer {
            inbound: Some(inbound_tx),
            outbound: outbound_rx,
            closed,
        },
    )
}

/// Frames written by the peer
pub struct MemorySource {
    rx: mpsc::Receiver<String>,
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        self.rx.recv().await.map(Ok)
    }
}

/// Frames read by the peer
pub struct MemorySink {
    tx: mpsc::Sender<String>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send_frame(&mut self, text: String) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::ConnectionClosed("memory".into()));
        }
        self.tx
            .send(text)
            .await
            .map_err(|_| Error::Transport("peer went away".into()))
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// The far end of a memory connection
pub struct RemotePeer {
    inbound: Option<mpsc::Sender<String>>,
    outbound: mpsc::Receiver<String>,
    closed: Arc<AtomicBool>,
}

impl RemotePeer {
    /// Send a frame to the local side. Returns `false` once nobody is reading.
    pub async fn send(&self, text: impl Into<String>) -> bool {
        match &self.inbound {
            Some(tx) => tx.send(text.into()).await.is_ok(),
            None => false,
        }
    }

    pub async fn send_json(&self, value: &Value) -> bool {
        self.send(value.to_string()).await
    }

    /// Next frame written by the local side, `None` after it dropped its sink
    pub async fn recv(&mut self) -> Option<String> {
        self.outbound.recv().await
    }

    /// Next frame as JSON. Frames that are not JSON are skipped.
    pub async fn recv_json(&mut self) -> Option<Value> {
        while let Some(text) = self.recv().await {
            if let Ok(value) = serde_json::from_str(&text) {
                return Some(value);
            }
        }
        None
    }

    /// Next already-delivered frame as JSON, without waiting
    pub fn try_recv_json(&mut self) -> Option<Value> {
        let text = self.outbound.try_recv().ok()?;
        serde_json::from_str(&text).ok()
    }

    /// End the stream of inbound frames, as a remote close would
    pub fn hang_up(&mut self) {
        self.inbound = None;
    }

    /// Whether the local side closed its sink
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (mut source, mut sink, mut peer) = connection(4);

        assert!(peer.send(r#"{"event":"connected"}"#).await);
        assert_eq!(
            source.next_frame().await.unwrap().unwrap(),
            r#"{"event":"connected"}"#
        );

        sink.send_frame("hello".into()).await.unwrap();
        assert_eq!(peer.recv().await.as_deref(), Some("hello"));

        peer.hang_up();
        assert!(source.next_frame().await.is_none());
    }

    #[tokio::test]
    async fn test_closed_sink_rejects_frames() {
        let (_source, mut sink, peer) = connection(4);
        sink.close().await.unwrap();
        assert!(peer.is_closed());
        assert!(sink.send_frame("late".into()).await.is_err());
    }
}
