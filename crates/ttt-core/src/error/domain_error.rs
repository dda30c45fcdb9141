//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::{GameId, InvitationId, Position, UserId};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Validation Errors (local preconditions, nothing sent)
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("It is not your turn")]
    NotYourTurn,

    #[error("Cell {0} is already taken")]
    CellTaken(Position),

    #[error("Invalid board position: {0}")]
    InvalidPosition(i64),

    #[error("Invalid board: {0:?}")]
    InvalidBoard(String),

    #[error("Invalid bot difficulty: {0}")]
    InvalidDifficulty(String),

    #[error("User {0} is not available for an invitation")]
    InvalidTarget(UserId),

    #[error("No pending invitation with id {0}")]
    UnknownInvitation(InvitationId),

    // =========================================================================
    // State Errors (operation not valid in the current phase)
    // =========================================================================
    #[error("Lobby is not ready yet")]
    LobbyNotReady,

    #[error("Match is not in progress")]
    MatchNotInProgress,

    #[error("Match is already over")]
    MatchOver,

    #[error("No active match")]
    NoActiveMatch,

    #[error("Game mismatch: expected {expected}, got {actual}")]
    GameMismatch { expected: GameId, actual: GameId },

    #[error("Turn owner {0:?} is not a player in this match")]
    InvalidTurnOwner(Option<UserId>),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string
    pub fn code(&self) -> &'static str {
        match self {
            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::NotYourTurn => "NOT_YOUR_TURN",
            Self::CellTaken(_) => "CELL_TAKEN",
            Self::InvalidPosition(_) => "INVALID_POSITION",
            Self::InvalidBoard(_) => "INVALID_BOARD",
            Self::InvalidDifficulty(_) => "INVALID_DIFFICULTY",
            Self::InvalidTarget(_) => "INVALID_TARGET",
            Self::UnknownInvitation(_) => "UNKNOWN_INVITATION",

            // State
            Self::LobbyNotReady => "LOBBY_NOT_READY",
            Self::MatchNotInProgress => "MATCH_NOT_IN_PROGRESS",
            Self::MatchOver => "MATCH_OVER",
            Self::NoActiveMatch => "NO_ACTIVE_MATCH",
            Self::GameMismatch { .. } => "GAME_MISMATCH",
            Self::InvalidTurnOwner(_) => "INVALID_TURN_OWNER",

            // Infrastructure
            Self::StorageError(_) => "STORAGE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a local validation failure
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::NotYourTurn
                | Self::CellTaken(_)
                | Self::InvalidPosition(_)
                | Self::InvalidBoard(_)
                | Self::InvalidDifficulty(_)
                | Self::InvalidTarget(_)
                | Self::UnknownInvitation(_)
        )
    }

    /// Check if the operation was issued in the wrong phase
    pub fn is_state(&self) -> bool {
        matches!(
            self,
            Self::LobbyNotReady
                | Self::MatchNotInProgress
                | Self::MatchOver
                | Self::NoActiveMatch
                | Self::GameMismatch { .. }
                | Self::InvalidTurnOwner(_)
        )
    }

    /// Check if this wraps an infrastructure failure
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::StorageError(_) | Self::InternalError(_))
    }
}
