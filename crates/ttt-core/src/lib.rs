//! # ttt-core
//!
//! Domain layer of the tic-tac-toe client: strict identifiers, the board
//! value object, lobby and match entities, and the persistence port.
//! This crate performs no I/O.

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Invitation, MatchResult, MatchState, OnlineUser, Outcome, PlayerSlot, ResultKind, Session,
};
pub use error::DomainError;
pub use traits::{SessionStore, StoreResult};
pub use value_objects::{
    Board, BoardDelta, BotDifficulty, Cell, GameId, IdParseError, InvitationId, Position, Symbol,
    UserId, WinningLine,
};
