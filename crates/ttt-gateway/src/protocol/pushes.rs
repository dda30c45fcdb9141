//! Pushes sent by the server

use serde::{Deserialize, Serialize};
use ttt_core::{
    Board, BotDifficulty, DomainError, GameId, Invitation, InvitationId, MatchResult, MatchState,
    OnlineUser, PlayerSlot, Position, ResultKind, UserId, WinningLine,
};

use crate::error::ProtocolError;
use crate::protocol::{EventName, GatewayMessage, PushCategory};

/// Message the backend sends when a command arrives on an unauthenticated socket
const NOT_AUTHENTICATED: &str = "Not authenticated";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedPayload {
    pub user_id: UserId,
    pub username: String,
}

/// `error` and `auth_error` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub message: String,
}

impl ErrorPayload {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The server lost track of this socket's session
    #[must_use]
    pub fn is_not_authenticated(&self) -> bool {
        self.message.eq_ignore_ascii_case(NOT_AUTHENTICATED)
    }
}

/// Full replacement of the online-user set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUsersPayload {
    #[serde(default)]
    pub users: Vec<OnlineUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationReceivedPayload {
    pub invitation_id: InvitationId,
    pub from_user_id: UserId,
    pub from_username: String,
}

impl InvitationReceivedPayload {
    #[must_use]
    pub fn into_invitation(self) -> Invitation {
        Invitation::new(self.invitation_id, self.from_user_id, self.from_username)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationSentPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation_id: Option<InvitationId>,
    pub to_username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationRejectedPayload {
    pub invitation_id: InvitationId,
}

/// Match start announcement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStartedPayload {
    pub game_id: GameId,
    pub player1: PlayerSlot,
    pub player2: PlayerSlot,
    #[serde(default)]
    pub board: Board,
    pub current_turn: Option<UserId>,
    #[serde(default)]
    pub is_bot_game: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_difficulty: Option<BotDifficulty>,
}

impl GameStartedPayload {
    /// Build the match state this announcement describes
    pub fn to_match_state(&self) -> Result<MatchState, DomainError> {
        Ok(MatchState::new(
            self.game_id,
            self.player1.clone(),
            self.player2.clone(),
            self.board,
            self.current_turn,
        )?
        .with_bot_difficulty(self.bot_difficulty))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameJoinedPayload {
    pub game_id: GameId,
}

/// Confirmed move; the board is authoritative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveMadePayload {
    pub game_id: GameId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// `None` for a bot move
    #[serde(default)]
    pub player_id: Option<UserId>,
    pub board: Board,
    #[serde(default)]
    pub current_turn: Option<UserId>,
    #[serde(default)]
    pub game_over: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_line: Option<WinningLine>,
}

impl MoveMadePayload {
    /// Final result carried by a game-over push
    #[must_use]
    pub fn final_result(&self) -> Option<MatchResult> {
        if !self.game_over {
            return None;
        }
        self.result
            .map(|kind| MatchResult::finished(kind, self.winner_id, self.winning_line))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameForfeitedPayload {
    pub game_id: GameId,
    pub forfeited_by: UserId,
    #[serde(default)]
    pub winner_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultKind>,
}

impl GameForfeitedPayload {
    #[must_use]
    pub fn to_result(&self) -> MatchResult {
        MatchResult::forfeit(
            self.result.unwrap_or(ResultKind::Abandoned),
            self.forfeited_by,
            self.winner_id,
        )
    }
}

/// A server push
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Push {
    Authenticated(AuthenticatedPayload),
    AuthError(ErrorPayload),
    OnlineUsers(OnlineUsersPayload),
    InvitationReceived(InvitationReceivedPayload),
    InvitationSent(InvitationSentPayload),
    InvitationRejected(InvitationRejectedPayload),
    GameStarted(GameStartedPayload),
    GameJoined(GameJoinedPayload),
    MoveMade(MoveMadePayload),
    GameForfeited(GameForfeitedPayload),
    Error(ErrorPayload),
}

impl Push {
    #[must_use]
    pub const fn event_name(&self) -> EventName {
        match self {
            Self::Authenticated(_) => EventName::Authenticated,
            Self::AuthError(_) => EventName::AuthError,
            Self::OnlineUsers(_) => EventName::OnlineUsers,
            Self::InvitationReceived(_) => EventName::InvitationReceived,
            Self::InvitationSent(_) => EventName::InvitationSent,
            Self::InvitationRejected(_) => EventName::InvitationRejected,
            Self::GameStarted(_) => EventName::GameStarted,
            Self::GameJoined(_) => EventName::GameJoined,
            Self::MoveMade(_) => EventName::MoveMade,
            Self::GameForfeited(_) => EventName::GameForfeited,
            Self::Error(_) => EventName::Error,
        }
    }

    #[must_use]
    pub fn category(&self) -> PushCategory {
        self.event_name()
            .category()
            .unwrap_or(PushCategory::Error)
    }

    /// Decode a received envelope as a push
    pub fn from_message(message: &GatewayMessage) -> Result<Self, ProtocolError> {
        let name = message.event_name()?;
        if !name.is_push() {
            return Err(ProtocolError::UnexpectedEvent(message.event.clone()));
        }
        let value = serde_json::to_value(message)?;
        serde_json::from_value(value).map_err(|source| ProtocolError::InvalidPayload {
            event: message.event.clone(),
            source,
        })
    }

    /// Build the wire envelope
    pub fn to_message(&self) -> Result<GatewayMessage, ProtocolError> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::from_value(value)?)
    }
}
