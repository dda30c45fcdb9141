//! Session entity - the authenticated identity of the local user

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value_objects::UserId;

/// Authenticated local user
///
/// Created on login or registration, persisted across restarts, and
/// destroyed on logout or an unrecoverable authentication failure.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub username: String,
    pub token: String,
}

impl Session {
    /// Create a new Session
    #[must_use]
    pub fn new(user_id: UserId, username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            token: token.into(),
        }
    }

    /// Value for an `Authorization` header
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

// Never print the token
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}
