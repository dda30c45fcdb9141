//! Gateway error types

use thiserror::Error;
use ttt_common::{AppError, ErrorCategory};

/// Failure to decode or encode a frame
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Event name outside the protocol
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// Known event travelling in the wrong direction
    #[error("Unexpected event: {0}")]
    UnexpectedEvent(String),

    /// Payload does not match the event's shape
    #[error("Invalid payload for {event}: {source}")]
    InvalidPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    /// Frame is not a JSON envelope
    #[error("Malformed frame: {0}")]
    Json(#[from] serde_json::Error),
}

/// Gateway error type
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No live connection
    #[error("Not connected")]
    NotConnected,

    /// Command attempted before the session is established
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The backend rejected the token; a fresh login is required
    #[error("Session revoked")]
    SessionRevoked,

    /// Outbound queue is full
    #[error("Outbound queue full")]
    Backpressure,

    /// Writer side of the connection is gone
    #[error("Connection closed")]
    ChannelClosed,

    /// Opening the connection failed
    #[error("Connect failed: {0}")]
    Connect(String),

    /// Opening the connection took too long
    #[error("Connect timed out")]
    ConnectTimeout,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl GatewayError {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotAuthenticated => ErrorCategory::Validation,
            Self::SessionRevoked => ErrorCategory::Authentication,
            Self::NotConnected
            | Self::Backpressure
            | Self::ChannelClosed
            | Self::Connect(_)
            | Self::ConnectTimeout => ErrorCategory::Transport,
            Self::Protocol(_) => ErrorCategory::Server,
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err.category() {
            ErrorCategory::Authentication => AppError::SessionRejected(err.to_string()),
            ErrorCategory::Validation => AppError::Validation(err.to_string()),
            ErrorCategory::Server => AppError::Server(err.to_string()),
            _ => AppError::Transport(err.to_string()),
        }
    }
}

/// Gateway result type
pub type GatewayResult<T> = Result<T, GatewayError>;
