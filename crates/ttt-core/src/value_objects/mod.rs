//! Value objects - immutable types that represent domain concepts

mod board;
mod difficulty;
mod ids;

pub use board::{Board, BoardDelta, Cell, Position, Symbol, WinningLine};
pub use difficulty::BotDifficulty;
pub use ids::{GameId, IdParseError, InvitationId, UserId};
