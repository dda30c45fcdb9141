//! Connection state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of the single backend connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No transport
    #[default]
    Disconnected,
    /// Transport being opened
    Connecting,
    /// Transport open, authenticate sent, no acknowledgement yet
    Connected,
    /// Session acknowledged by the backend
    Authenticated,
    /// Token rejected; terminal until a fresh `connect`
    AuthFailed,
}

impl ConnectionState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Authenticated => "authenticated",
            Self::AuthFailed => "auth_failed",
        }
    }

    /// A connection attempt is underway or established
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected | Self::Authenticated)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
