//! Persistence port for client-local state
//!
//! Two documents survive a restart: the authenticated session and the
//! snapshot of the match handed from the lobby to the match view.

use async_trait::async_trait;

use crate::entities::{MatchState, Session};
use crate::error::DomainError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, DomainError>;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the persisted session, if any
    async fn load_session(&self) -> StoreResult<Option<Session>>;

    /// Persist the session, replacing any previous one
    async fn save_session(&self, session: &Session) -> StoreResult<()>;

    /// Remove the session
    async fn clear_session(&self) -> StoreResult<()>;

    /// Load the match snapshot, if any
    async fn load_match(&self) -> StoreResult<Option<MatchState>>;

    /// Persist the match snapshot
    async fn save_match(&self, state: &MatchState) -> StoreResult<()>;

    /// Remove the match snapshot
    async fn clear_match(&self) -> StoreResult<()>;

    /// Remove everything (logout)
    async fn clear_all(&self) -> StoreResult<()> {
        self.clear_match().await?;
        self.clear_session().await
    }
}
