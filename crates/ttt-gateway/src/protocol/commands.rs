//! Commands sent by the client

use serde::{Deserialize, Serialize};
use ttt_core::{BotDifficulty, GameId, InvitationId, Position, UserId};

use crate::error::ProtocolError;
use crate::protocol::{EventName, GatewayMessage};

/// A client command
///
/// Serializes straight into the `{"event", "data"}` envelope. Never log a
/// command with `{:?}`: `Authenticate` carries the bearer token. Log its
/// [`event_name`](Self::event_name) instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Command {
    Authenticate {
        token: String,
    },
    InvitePlayer {
        target_user_id: UserId,
    },
    AcceptInvitation {
        invitation_id: InvitationId,
    },
    RejectInvitation {
        invitation_id: InvitationId,
    },
    PlayVsBot {
        difficulty: BotDifficulty,
    },
    JoinGame {
        game_id: GameId,
    },
    MakeMove {
        game_id: GameId,
        position: Position,
    },
    ForfeitGame {
        game_id: GameId,
    },
}

impl Command {
    #[must_use]
    pub const fn event_name(&self) -> EventName {
        match self {
            Self::Authenticate { .. } => EventName::Authenticate,
            Self::InvitePlayer { .. } => EventName::InvitePlayer,
            Self::AcceptInvitation { .. } => EventName::AcceptInvitation,
            Self::RejectInvitation { .. } => EventName::RejectInvitation,
            Self::PlayVsBot { .. } => EventName::PlayVsBot,
            Self::JoinGame { .. } => EventName::JoinGame,
            Self::MakeMove { .. } => EventName::MakeMove,
            Self::ForfeitGame { .. } => EventName::ForfeitGame,
        }
    }

    /// Whether the session must be established before sending
    #[must_use]
    pub const fn requires_authentication(&self) -> bool {
        !matches!(self, Self::Authenticate { .. })
    }

    /// Game this command targets, if any
    #[must_use]
    pub const fn game_id(&self) -> Option<GameId> {
        match self {
            Self::JoinGame { game_id }
            | Self::MakeMove { game_id, .. }
            | Self::ForfeitGame { game_id } => Some(*game_id),
            _ => None,
        }
    }

    /// Build the wire envelope
    pub fn to_message(&self) -> Result<GatewayMessage, ProtocolError> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Decode a received envelope as a command
    pub fn from_message(message: &GatewayMessage) -> Result<Self, ProtocolError> {
        let name = message.event_name()?;
        if !name.is_command() {
            return Err(ProtocolError::UnexpectedEvent(message.event.clone()));
        }
        let value = serde_json::to_value(message)?;
        serde_json::from_value(value).map_err(|source| ProtocolError::InvalidPayload {
            event: message.event.clone(),
            source,
        })
    }
}
