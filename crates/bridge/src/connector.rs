//! Outbound connection to the realtime agent

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::{HeaderName, HeaderValue, AUTHORIZATION};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use voice_relay_config::AgentEndpointConfig;
use voice_relay_core::{Error, FrameSink, FrameSource, Result};

/// Both halves of a connected agent session
pub struct AgentConnection {
    pub source: Box<dyn FrameSource>,
    pub sink: Box<dyn FrameSink>,
}

/// Opens one agent connection per call
#[async_trait]
pub trait AgentConnector: Send + Sync {
    async fn connect(&self) -> Result<AgentConnection>;
}

/// Websocket client for the realtime agent endpoint
pub struct RealtimeConnector {
    config: AgentEndpointConfig,
}

impl RealtimeConnector {
    pub fn new(config: AgentEndpointConfig) -> Self {
        Self { config }
    }

    /// Handshake request with credentials and protocol headers
    pub fn build_request(&self) -> Result<Request> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Connect("no agent API key configured".into()))?;

        let mut request = self
            .config
            .endpoint_url()
            .into_client_request()
            .map_err(|e| Error::Connect(e.to_string()))?;

        let headers = request.headers_mut();
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", api_key))?);
        if let Some(beta) = self.config.beta_header.as_deref() {
            headers.insert(HeaderName::from_static("openai-beta"), header_value(beta)?);
        }
        Ok(request)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::Connect(format!("invalid header value: {}", e)))
}

#[async_trait]
impl AgentConnector for RealtimeConnector {
    async fn connect(&self) -> Result<AgentConnection> {
        let request = self.build_request()?;
        let timeout = Duration::from_millis(self.config.connect_timeout_ms);

        let (stream, response) = tokio::time::timeout(timeout, connect_async(request))
            .await
            .map_err(|_| {
                Error::Connect(format!(
                    "handshake timed out after {}ms",
                    self.config.connect_timeout_ms
                ))
            })?
            .map_err(|e| Error::Connect(e.to_string()))?;

        tracing::info!(
            url = %self.config.url,
            model = %self.config.model,
            status = %response.status(),
            "Connected to agent endpoint"
        );

        let (sink, source) = stream.split();
        Ok(AgentConnection {
            source: Box::new(WsSource { inner: source }),
            sink: Box::new(WsSink { inner: sink }),
        })
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct WsSource {
    inner: SplitStream<WsStream>,
}

#[async_trait]
impl FrameSource for WsSource {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        loop {
            match self.inner.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(data)) => {
                    return Some(String::from_utf8(data).map_err(|_| {
                        Error::MalformedFrame("binary frame is not UTF-8".into())
                    }))
                }
                Ok(Message::Close(frame)) => {
                    tracing::debug!(frame = ?frame, "Agent closed the connection");
                    return None;
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return None,
                Err(e) => return Some(Err(Error::Transport(e.to_string()))),
            }
        }
    }
}

struct WsSink {
    inner: SplitSink<WsStream, Message>,
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_frame(&mut self, text: String) -> Result<()> {
        self.inner
            .send(Message::Text(text))
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        match self.inner.close().await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(Error::Transport(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(api_key: Option<&str>) -> AgentEndpointConfig {
        AgentEndpointConfig {
            api_key: api_key.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_request_headers() {
        let connector = RealtimeConnector::new(endpoint(Some("sk-test")));
        let request = connector.build_request().unwrap();

        assert_eq!(request.headers()["authorization"], "Bearer sk-test");
        assert_eq!(request.headers()["openai-beta"], "realtime=v1");
        let uri = request.uri().to_string();
        assert!(uri.starts_with("wss://api.openai.com/v1/realtime?model="));
    }

    #[test]
    fn test_beta_header_optional() {
        let mut config = endpoint(Some("sk-test"));
        config.beta_header = None;
        let request = RealtimeConnector::new(config).build_request().unwrap();
        assert!(request.headers().get("openai-beta").is_none());
    }

    #[test]
    fn test_missing_key_is_connect_error() {
        let err = RealtimeConnector::new(endpoint(None))
            .build_request()
            .unwrap_err();
        assert!(matches!(err, Error::Connect(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let mut config = endpoint(Some("sk-test"));
        config.url = "ws://127.0.0.1:9".into();
        config.connect_timeout_ms = 2000;

        let result = RealtimeConnector::new(config).connect().await;
        assert!(matches!(result, Err(Error::Connect(_))));
    }
}
