//! Client notifications
//!
//! The typed event channel a presentation layer subscribes to. Nothing here
//! knows about rendering.

use tokio::sync::mpsc::{self, error::TrySendError};
use ttt_api::{GameHistoryEntry, LeaderboardEntry, UserStats};
use ttt_common::ErrorCategory;
use ttt_core::{GameId, Invitation, InvitationId, MatchState, OnlineUser, Outcome, UserId};

/// State change reported to the presentation layer
#[derive(Debug, Clone)]
pub enum ClientNotification {
    LoggedIn {
        user_id: UserId,
        username: String,
    },
    LoggedOut,
    Connecting,
    SessionReady {
        user_id: UserId,
        username: String,
        /// Re-authentication on a live connection
        resumed: bool,
    },
    /// Session destroyed; a fresh login is required
    SessionRevoked {
        reason: String,
    },
    ReauthRequested,
    Disconnected {
        reason: String,
    },
    /// Online users other than the local one, sorted by name
    PresenceChanged(Vec<OnlineUser>),
    InvitationReceived(Invitation),
    InvitationSent {
        to_username: String,
    },
    InvitationDeclined {
        invitation_id: InvitationId,
    },
    /// Pending invitations in arrival order
    PendingInvitations(Vec<Invitation>),
    /// Lobby-to-match handoff; the view leaves the lobby
    MatchStarted(MatchState),
    MatchJoined {
        game_id: GameId,
    },
    BoardChanged(MatchState),
    MatchFinished {
        state: MatchState,
        outcome: Option<Outcome>,
    },
    /// Forfeit requested; waiting for confirmation
    ForfeitPending {
        game_id: GameId,
    },
    ReturnedToLobby,
    /// Error reported by the backend
    ServerError {
        message: String,
    },
    /// A local operation failed
    RequestFailed {
        code: String,
        message: String,
        category: ErrorCategory,
    },
    Leaderboard(Vec<LeaderboardEntry>),
    Stats(UserStats),
    History(Vec<GameHistoryEntry>),
}

impl ClientNotification {
    /// Whole-state snapshot that the next one of its kind replaces
    pub fn is_snapshot(&self) -> bool {
        matches!(self, Self::PresenceChanged(_) | Self::BoardChanged(_))
    }
}

/// Sending half of the notification channel
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::Sender<ClientNotification>,
}

impl Notifier {
    /// Create a notifier and its receiving end
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<ClientNotification>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }

    /// Deliver a notification.
    ///
    /// Snapshots that a later push replaces are dropped when the channel is
    /// full; every other notification waits for room.
    pub async fn notify(&self, notification: ClientNotification) {
        if notification.is_snapshot() {
            match self.tx.try_send(notification) {
                Ok(()) | Err(TrySendError::Closed(_)) => {}
                Err(TrySendError::Full(dropped)) => {
                    tracing::warn!(notification = ?dropped, "Notification channel full; dropping snapshot");
                }
            }
            return;
        }
        if self.tx.send(notification).await.is_err() {
            tracing::trace!("No notification subscriber");
        }
    }
}
