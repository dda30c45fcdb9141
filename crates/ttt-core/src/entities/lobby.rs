//! Lobby entities - online users and pending invitations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{InvitationId, UserId};

/// A user currently connected to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUser {
    #[serde(rename = "id")]
    pub user_id: UserId,
    pub username: String,
    #[serde(default)]
    pub in_game: bool,
}

impl OnlineUser {
    /// Create a new OnlineUser
    #[must_use]
    pub fn new(user_id: UserId, username: impl Into<String>, in_game: bool) -> Self {
        Self {
            user_id,
            username: username.into(),
            in_game,
        }
    }

    /// Whether this user can receive an invitation right now
    #[must_use]
    pub fn is_available(&self) -> bool {
        !self.in_game
    }
}

/// An invitation addressed to the local user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub invitation_id: InvitationId,
    pub from_user_id: UserId,
    pub from_username: String,
    pub received_at: DateTime<Utc>,
}

impl Invitation {
    /// Create a new Invitation received now
    #[must_use]
    pub fn new(
        invitation_id: InvitationId,
        from_user_id: UserId,
        from_username: impl Into<String>,
    ) -> Self {
        Self {
            invitation_id,
            from_user_id,
            from_username: from_username.into(),
            received_at: Utc::now(),
        }
    }
}
