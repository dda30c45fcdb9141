//! Lobby coordinator
//!
//! Holds the online-user set and the pending invitations, and issues the
//! invite/accept/reject/play-vs-bot commands. Commands are refused locally
//! until the session is established.

use std::collections::HashMap;
use tracing::{debug, info, instrument};
use ttt_core::{
    BotDifficulty, DomainError, Invitation, InvitationId, MatchState, OnlineUser, UserId,
};
use ttt_gateway::protocol::{GameStartedPayload, InvitationReceivedPayload};
use ttt_gateway::{Command, CommandSink};

use super::error::ServiceResult;

/// Lobby lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LobbyPhase {
    /// No connection
    #[default]
    Idle,
    /// Connection opening; waiting for the session
    AwaitingAuth,
    /// Session established; commands accepted
    Active,
}

/// Lobby coordinator
#[derive(Debug, Default)]
pub struct LobbyCoordinator {
    phase: LobbyPhase,
    local_user: Option<UserId>,
    online: HashMap<UserId, OnlineUser>,
    invitations: Vec<Invitation>,
}

impl LobbyCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> LobbyPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == LobbyPhase::Active
    }

    // === Lifecycle ===

    /// A connection attempt started
    pub fn on_connecting(&mut self) {
        if self.phase == LobbyPhase::Idle {
            self.set_phase(LobbyPhase::AwaitingAuth);
        }
    }

    /// The backend acknowledged the session
    pub fn on_session_ready(&mut self, user_id: UserId) {
        self.local_user = Some(user_id);
        self.online.remove(&user_id);
        self.set_phase(LobbyPhase::Active);
    }

    /// The connection went away; the presence set is stale
    pub fn on_disconnected(&mut self) {
        self.online.clear();
        self.set_phase(LobbyPhase::Idle);
    }

    /// Forget everything (logout or revoked session)
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // === Presence ===

    /// Replace the online-user set; the local user is never listed
    pub fn on_presence_push(&mut self, users: Vec<OnlineUser>) {
        let local = self.local_user;
        self.online = users
            .into_iter()
            .filter(|u| Some(u.user_id) != local)
            .map(|u| (u.user_id, u))
            .collect();
        debug!(count = self.online.len(), "Presence updated");
    }

    /// Online users sorted by name
    pub fn online_users(&self) -> Vec<OnlineUser> {
        let mut users: Vec<OnlineUser> = self.online.values().cloned().collect();
        users.sort_by(|a, b| {
            a.username
                .to_lowercase()
                .cmp(&b.username.to_lowercase())
                .then(a.user_id.cmp(&b.user_id))
        });
        users
    }

    pub fn user(&self, user_id: UserId) -> Option<&OnlineUser> {
        self.online.get(&user_id)
    }

    // === Invitations ===

    /// Invite an online, idle user
    #[instrument(skip(self, sink))]
    pub fn invite(&self, sink: &mut dyn CommandSink, target_user_id: UserId) -> ServiceResult<()> {
        self.ensure_active()?;
        match self.online.get(&target_user_id) {
            Some(user) if user.is_available() => {}
            _ => return Err(DomainError::InvalidTarget(target_user_id).into()),
        }

        sink.dispatch(Command::InvitePlayer { target_user_id })?;
        info!(target_user_id = %target_user_id, "Invitation requested");
        Ok(())
    }

    /// Record an incoming invitation; duplicates from one sender coexist
    pub fn on_invitation_received(&mut self, payload: InvitationReceivedPayload) -> &Invitation {
        let invitation = payload.into_invitation();
        info!(
            invitation_id = %invitation.invitation_id,
            from = %invitation.from_username,
            "Invitation received"
        );
        self.invitations.push(invitation);
        &self.invitations[self.invitations.len() - 1]
    }

    /// Pending invitations in arrival order
    pub fn pending_invitations(&self) -> &[Invitation] {
        &self.invitations
    }

    /// Accept an invitation; it leaves the pending list once sent
    #[instrument(skip(self, sink))]
    pub fn accept(
        &mut self,
        sink: &mut dyn CommandSink,
        invitation_id: InvitationId,
    ) -> ServiceResult<Invitation> {
        self.respond(sink, invitation_id, true)
    }

    /// Reject an invitation; it leaves the pending list once sent
    #[instrument(skip(self, sink))]
    pub fn reject(
        &mut self,
        sink: &mut dyn CommandSink,
        invitation_id: InvitationId,
    ) -> ServiceResult<Invitation> {
        self.respond(sink, invitation_id, false)
    }

    fn respond(
        &mut self,
        sink: &mut dyn CommandSink,
        invitation_id: InvitationId,
        accept: bool,
    ) -> ServiceResult<Invitation> {
        self.ensure_active()?;
        let index = self
            .invitations
            .iter()
            .position(|inv| inv.invitation_id == invitation_id)
            .ok_or(DomainError::UnknownInvitation(invitation_id))?;

        let command = if accept {
            Command::AcceptInvitation { invitation_id }
        } else {
            Command::RejectInvitation { invitation_id }
        };
        sink.dispatch(command)?;

        let invitation = self.invitations.remove(index);
        info!(invitation_id = %invitation_id, accept, "Invitation answered");
        Ok(invitation)
    }

    // === Matches ===

    /// Ask the backend for a bot match
    #[instrument(skip(self, sink))]
    pub fn play_vs_bot(
        &self,
        sink: &mut dyn CommandSink,
        difficulty: BotDifficulty,
    ) -> ServiceResult<()> {
        self.ensure_active()?;
        sink.dispatch(Command::PlayVsBot { difficulty })?;
        info!(difficulty = %difficulty, "Bot match requested");
        Ok(())
    }

    /// Match-start handoff: build the match state and leave the lobby
    pub fn on_match_start(&mut self, payload: &GameStartedPayload) -> ServiceResult<MatchState> {
        let state = payload.to_match_state()?;
        if !self.invitations.is_empty() {
            debug!(
                count = self.invitations.len(),
                "Clearing pending invitations on match start"
            );
            self.invitations.clear();
        }
        info!(game_id = %state.game_id(), bot = state.is_bot_game(), "Match started");
        Ok(state)
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(DomainError::LobbyNotReady)
        }
    }

    fn set_phase(&mut self, next: LobbyPhase) {
        if self.phase != next {
            debug!(from = ?self.phase, to = ?next, "Lobby phase changed");
            self.phase = next;
        }
    }
}
