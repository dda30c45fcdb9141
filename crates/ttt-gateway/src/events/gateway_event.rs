//! Gateway events
//!
//! What the connection manager hands to the coordinators after decoding and
//! routing a frame. Session outcomes are interpreted here; every other push is
//! passed through under its category.

use std::fmt;
use ttt_core::{GameId, OnlineUser, UserId};

use crate::protocol::{
    GameForfeitedPayload, GameJoinedPayload, GameStartedPayload, InvitationReceivedPayload,
    InvitationRejectedPayload, InvitationSentPayload, MoveMadePayload,
};

/// Why the connection went away
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Server sent a close frame
    ServerClosed(Option<String>),
    /// Socket failed
    Error(String),
    /// Stream ended without a close frame
    StreamEnded,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerClosed(Some(reason)) => write!(f, "closed by server: {reason}"),
            Self::ServerClosed(None) => f.write_str("closed by server"),
            Self::Error(e) => write!(f, "connection error: {e}"),
            Self::StreamEnded => f.write_str("connection lost"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvitationPush {
    Received(InvitationReceivedPayload),
    Sent(InvitationSentPayload),
    Rejected(InvitationRejectedPayload),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchPush {
    Started(GameStartedPayload),
    Joined(GameJoinedPayload),
    MoveMade(MoveMadePayload),
    Forfeited(GameForfeitedPayload),
}

impl MatchPush {
    /// Game the push refers to
    #[must_use]
    pub fn game_id(&self) -> GameId {
        match self {
            Self::Started(p) => p.game_id,
            Self::Joined(p) => p.game_id,
            Self::MoveMade(p) => p.game_id,
            Self::Forfeited(p) => p.game_id,
        }
    }
}

/// Event reported by the connection manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// The backend acknowledged the token
    SessionReady {
        user_id: UserId,
        username: String,
        /// Acknowledgement of a re-authentication on a live connection
        reauthenticated: bool,
    },
    /// The backend rejected the token; the session is void
    AuthRejected { reason: String },
    /// The backend lost the session; one re-authentication was sent
    ReauthRequested,
    /// The connection was lost
    Disconnected { reason: DisconnectReason },
    /// Full online-user set
    Presence(Vec<OnlineUser>),
    Invitation(InvitationPush),
    Match(MatchPush),
    /// Generic error reported by the backend
    ServerError { message: String },
}
