//! Domain entities - session, lobby and match state

mod lobby;
mod matches;
mod session;

pub use lobby::{Invitation, OnlineUser};
pub use matches::{MatchResult, MatchState, Outcome, PlayerSlot, ResultKind};
pub use session::Session;
