//! Voice Relay Server
//!
//! HTTP call-control endpoint and media-stream websocket in front of the relay.

pub mod http;
pub mod state;
pub mod twiml;
pub mod websocket;

pub use http::create_router;
pub use state::AppState;
pub use websocket::MediaStreamHandler;

use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Relay error: {0}")]
    Relay(#[from] voice_relay_core::Error),
}

impl From<ServerError> for axum::http::StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::InvalidRequest(_) => axum::http::StatusCode::BAD_REQUEST,
            ServerError::Relay(_) => axum::http::StatusCode::BAD_GATEWAY,
        }
    }
}
