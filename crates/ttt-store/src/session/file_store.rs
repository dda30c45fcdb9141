//! File-backed store.
//!
//! Each key is a JSON document `<dir>/<key>.json`. Writes go to a temporary
//! sibling first and are renamed into place, so a crash never leaves a
//! half-written session behind. A document that no longer parses is
//! discarded and reported as absent.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use ttt_core::{MatchState, Session, SessionStore, StoreResult};

use super::{MATCH_KEY, SESSION_KEY};
use crate::error::StoreError;

/// Store that persists documents under a directory
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Create a store rooted at `dir` (created lazily on first write)
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let path = self.path(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, path = %path.display(), error = %e, "Discarding unreadable document");
                self.remove(key).await?;
                Ok(None)
            }
        }
    }

    async fn write<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        let bytes = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::trace!(key, path = %path.display(), "Document written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load_session(&self) -> StoreResult<Option<Session>> {
        Ok(self.read(SESSION_KEY).await?)
    }

    async fn save_session(&self, session: &Session) -> StoreResult<()> {
        tracing::debug!(user_id = %session.user_id, "Persisting session");
        Ok(self.write(SESSION_KEY, session).await?)
    }

    async fn clear_session(&self) -> StoreResult<()> {
        tracing::debug!("Clearing session");
        Ok(self.remove(SESSION_KEY).await?)
    }

    async fn load_match(&self) -> StoreResult<Option<MatchState>> {
        Ok(self.read(MATCH_KEY).await?)
    }

    async fn save_match(&self, state: &MatchState) -> StoreResult<()> {
        Ok(self.write(MATCH_KEY, state).await?)
    }

    async fn clear_match(&self) -> StoreResult<()> {
        Ok(self.remove(MATCH_KEY).await?)
    }
}
