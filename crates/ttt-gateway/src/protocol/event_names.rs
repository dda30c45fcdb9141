//! Event names
//!
//! The closed set of `event` values either side may put on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ProtocolError;

/// Category a push is routed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushCategory {
    /// Handshake outcome
    Session,
    Presence,
    Invitation,
    Match,
    /// Generic server error report
    Error,
}

/// Every event name in the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    // Commands (client -> server)
    Authenticate,
    InvitePlayer,
    AcceptInvitation,
    RejectInvitation,
    PlayVsBot,
    JoinGame,
    MakeMove,
    ForfeitGame,

    // Pushes (server -> client)
    Authenticated,
    AuthError,
    OnlineUsers,
    InvitationReceived,
    InvitationSent,
    InvitationRejected,
    GameStarted,
    GameJoined,
    MoveMade,
    GameForfeited,
    Error,
}

impl EventName {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authenticate => "authenticate",
            Self::InvitePlayer => "invite_player",
            Self::AcceptInvitation => "accept_invitation",
            Self::RejectInvitation => "reject_invitation",
            Self::PlayVsBot => "play_vs_bot",
            Self::JoinGame => "join_game",
            Self::MakeMove => "make_move",
            Self::ForfeitGame => "forfeit_game",
            Self::Authenticated => "authenticated",
            Self::AuthError => "auth_error",
            Self::OnlineUsers => "online_users",
            Self::InvitationReceived => "invitation_received",
            Self::InvitationSent => "invitation_sent",
            Self::InvitationRejected => "invitation_rejected",
            Self::GameStarted => "game_started",
            Self::GameJoined => "game_joined",
            Self::MoveMade => "move_made",
            Self::GameForfeited => "game_forfeited",
            Self::Error => "error",
        }
    }

    /// Parse a wire name
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "authenticate" => Some(Self::Authenticate),
            "invite_player" => Some(Self::InvitePlayer),
            "accept_invitation" => Some(Self::AcceptInvitation),
            "reject_invitation" => Some(Self::RejectInvitation),
            "play_vs_bot" => Some(Self::PlayVsBot),
            "join_game" => Some(Self::JoinGame),
            "make_move" => Some(Self::MakeMove),
            "forfeit_game" => Some(Self::ForfeitGame),
            "authenticated" => Some(Self::Authenticated),
            "auth_error" => Some(Self::AuthError),
            "online_users" => Some(Self::OnlineUsers),
            "invitation_received" => Some(Self::InvitationReceived),
            "invitation_sent" => Some(Self::InvitationSent),
            "invitation_rejected" => Some(Self::InvitationRejected),
            "game_started" => Some(Self::GameStarted),
            "game_joined" => Some(Self::GameJoined),
            "move_made" => Some(Self::MoveMade),
            "game_forfeited" => Some(Self::GameForfeited),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Parse a wire name, failing with a protocol error
    pub fn parse(s: &str) -> Result<Self, ProtocolError> {
        Self::from_str(s).ok_or_else(|| ProtocolError::UnknownEvent(s.to_string()))
    }

    /// Check if the client sends this event
    #[must_use]
    pub const fn is_command(self) -> bool {
        matches!(
            self,
            Self::Authenticate
                | Self::InvitePlayer
                | Self::AcceptInvitation
                | Self::RejectInvitation
                | Self::PlayVsBot
                | Self::JoinGame
                | Self::MakeMove
                | Self::ForfeitGame
        )
    }

    /// Check if the server sends this event
    #[must_use]
    pub const fn is_push(self) -> bool {
        !self.is_command()
    }

    /// Routing category of a push (`None` for commands)
    #[must_use]
    pub const fn category(self) -> Option<PushCategory> {
        match self {
            Self::Authenticated | Self::AuthError => Some(PushCategory::Session),
            Self::OnlineUsers => Some(PushCategory::Presence),
            Self::InvitationReceived | Self::InvitationSent | Self::InvitationRejected => {
                Some(PushCategory::Invitation)
            }
            Self::GameStarted | Self::GameJoined | Self::MoveMade | Self::GameForfeited => {
                Some(PushCategory::Match)
            }
            Self::Error => Some(PushCategory::Error),
            _ => None,
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
