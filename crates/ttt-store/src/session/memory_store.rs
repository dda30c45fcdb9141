//! In-memory store

use async_trait::async_trait;
use parking_lot::RwLock;
use ttt_core::{MatchState, Session, SessionStore, StoreResult};

/// Process-local store; nothing survives a restart
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
    snapshot: RwLock<Option<MatchState>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a session already present
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
            snapshot: RwLock::new(None),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load_session(&self) -> StoreResult<Option<Session>> {
        Ok(self.session.read().clone())
    }

    async fn save_session(&self, session: &Session) -> StoreResult<()> {
        *self.session.write() = Some(session.clone());
        Ok(())
    }

    async fn clear_session(&self) -> StoreResult<()> {
        *self.session.write() = None;
        Ok(())
    }

    async fn load_match(&self) -> StoreResult<Option<MatchState>> {
        Ok(self.snapshot.read().clone())
    }

    async fn save_match(&self, state: &MatchState) -> StoreResult<()> {
        *self.snapshot.write() = Some(state.clone());
        Ok(())
    }

    async fn clear_match(&self) -> StoreResult<()> {
        *self.snapshot.write() = None;
        Ok(())
    }
}
