//! Session and match snapshot stores

mod file_store;
mod memory_store;

pub use file_store::FileSessionStore;
pub use memory_store::MemorySessionStore;

/// Key of the persisted session document
pub const SESSION_KEY: &str = "tictactoe_session";
/// Key of the persisted match snapshot
pub const MATCH_KEY: &str = "current_game";
