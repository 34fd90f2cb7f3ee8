//! Error types

use thiserror::Error;

/// Relay errors
#[derive(Error, Debug)]
pub enum Error {
    /// The outbound connection could not be established
    #[error("Connection failed: {0}")]
    Connect(String),

    /// A send was attempted on a link that is no longer open
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Socket-level read or write failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Inbound frame could not be decoded
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error should end the call.
    ///
    /// Malformed frames are dropped individually; everything else is terminal
    /// for the call it happened on.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Error::MalformedFrame(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_frame_is_not_terminal() {
        assert!(!Error::MalformedFrame("bad json".into()).is_terminal());
        assert!(Error::Transport("reset".into()).is_terminal());
        assert!(Error::ConnectionClosed("agent".into()).is_terminal());
    }
}
