//! Match coordinator
//!
//! Mirrors one server-owned match. The board only changes when a push
//! confirms it; local checks exist to avoid doomed round trips, never to
//! predict the board. `Terminal` is absorbing.

use tracing::{debug, info, instrument, warn};
use ttt_core::{BoardDelta, DomainError, GameId, MatchState, Outcome, Position, UserId};
use ttt_gateway::protocol::{GameForfeitedPayload, GameJoinedPayload, MoveMadePayload};
use ttt_gateway::{Command, CommandSink};

use super::error::ServiceResult;

/// Match lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Handed off; join not yet sent
    Loading,
    /// Join sent; waiting for the acknowledgement
    AwaitingJoinAck,
    InProgress,
    /// Game over or forfeited; nothing more is sent
    Terminal,
}

/// Outcome of applying a push
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchUpdate {
    /// Push did not apply (other game, duplicate, stale, already over)
    Ignored,
    Joined,
    BoardChanged(BoardDelta),
    Finished(Option<Outcome>),
}

/// Proof that the user confirmed a forfeit of a specific game
#[derive(Debug, PartialEq, Eq)]
pub struct ForfeitConfirmation {
    game_id: GameId,
}

impl ForfeitConfirmation {
    pub fn game_id(&self) -> GameId {
        self.game_id
    }
}

/// Match coordinator
#[derive(Debug, Clone)]
pub struct MatchCoordinator {
    local_user: UserId,
    state: MatchState,
    phase: MatchPhase,
}

impl MatchCoordinator {
    /// Take over a match from the lobby handoff or a stored snapshot
    pub fn new(local_user: UserId, state: MatchState) -> Self {
        let phase = if state.is_terminal() {
            MatchPhase::Terminal
        } else {
            MatchPhase::Loading
        };
        Self {
            local_user,
            state,
            phase,
        }
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn game_id(&self) -> GameId {
        self.state.game_id()
    }

    pub fn local_user(&self) -> UserId {
        self.local_user
    }

    pub fn is_terminal(&self) -> bool {
        self.phase == MatchPhase::Terminal
    }

    pub fn is_my_turn(&self) -> bool {
        self.phase == MatchPhase::InProgress && self.state.is_turn_of(self.local_user)
    }

    /// Result framed for the local user, once terminal
    pub fn outcome(&self) -> Option<Outcome> {
        self.state.outcome_for(self.local_user)
    }

    /// Cells to highlight (winning line)
    pub fn highlighted(&self) -> Vec<Position> {
        self.state.highlighted()
    }

    // === Lifecycle ===

    /// Send the join for this game. Returns `false` once terminal.
    pub fn join(&mut self, sink: &mut dyn CommandSink) -> ServiceResult<bool> {
        if self.is_terminal() {
            return Ok(false);
        }
        sink.dispatch(Command::JoinGame {
            game_id: self.game_id(),
        })?;
        info!(game_id = %self.game_id(), "Joining match");
        self.set_phase(MatchPhase::AwaitingJoinAck);
        Ok(true)
    }

    /// Connection lost; the next session rejoins
    pub fn on_disconnected(&mut self) {
        if !self.is_terminal() {
            self.set_phase(MatchPhase::Loading);
        }
    }

    pub fn on_joined(&mut self, payload: &GameJoinedPayload) -> MatchUpdate {
        if !self.is_current(payload.game_id) {
            return MatchUpdate::Ignored;
        }
        match self.phase {
            MatchPhase::Loading | MatchPhase::AwaitingJoinAck => {
                self.set_phase(MatchPhase::InProgress);
                MatchUpdate::Joined
            }
            MatchPhase::InProgress | MatchPhase::Terminal => MatchUpdate::Ignored,
        }
    }

    // === Commands ===

    /// Send a move after the local legality checks
    #[instrument(skip(self, sink), fields(game_id = %self.game_id()))]
    pub fn make_move(&self, sink: &mut dyn CommandSink, position: Position) -> ServiceResult<()> {
        self.ensure_in_progress()?;
        self.state.check_move(self.local_user, position)?;

        sink.dispatch(Command::MakeMove {
            game_id: self.game_id(),
            position,
        })?;
        debug!(position = %position, "Move sent");
        Ok(())
    }

    /// First forfeit step; the caller must confirm with the user
    pub fn request_forfeit(&self) -> ServiceResult<ForfeitConfirmation> {
        self.ensure_in_progress()?;
        Ok(ForfeitConfirmation {
            game_id: self.game_id(),
        })
    }

    /// Second forfeit step. The match stays live until the server confirms.
    #[instrument(skip(self, sink, confirmation), fields(game_id = %self.game_id()))]
    pub fn forfeit(
        &self,
        sink: &mut dyn CommandSink,
        confirmation: ForfeitConfirmation,
    ) -> ServiceResult<()> {
        if confirmation.game_id != self.game_id() {
            return Err(DomainError::GameMismatch {
                expected: self.game_id(),
                actual: confirmation.game_id,
            }
            .into());
        }
        self.ensure_in_progress()?;

        sink.dispatch(Command::ForfeitGame {
            game_id: self.game_id(),
        })?;
        info!("Forfeit sent");
        Ok(())
    }

    // === Pushes ===

    /// Apply a confirmed move
    pub fn on_move_made(&mut self, payload: &MoveMadePayload) -> ServiceResult<MatchUpdate> {
        if !self.is_current(payload.game_id) || self.is_terminal() {
            return Ok(MatchUpdate::Ignored);
        }

        if payload.game_over {
            let delta = self.state.conclude(payload.board, payload.final_result())?;
            if let BoardDelta::Conflict(cells) = &delta {
                warn!(cells = ?cells, "Final board disagrees with local board");
            }
            self.set_phase(MatchPhase::Terminal);
            let outcome = self.outcome();
            info!(
                game_id = %self.game_id(),
                result = ?self.state.result().map(|r| r.kind),
                outcome = ?outcome,
                "Match finished"
            );
            return Ok(MatchUpdate::Finished(outcome));
        }

        let delta = self.state.apply_move(payload.board, payload.current_turn)?;
        match &delta {
            BoardDelta::Unchanged | BoardDelta::Stale => {
                debug!(delta = ?delta, "Ignoring repeated or stale move");
                return Ok(MatchUpdate::Ignored);
            }
            BoardDelta::Move(position) => {
                debug!(position = %position, player_id = ?payload.player_id, "Move applied");
            }
            BoardDelta::Advance(cells) => {
                info!(cells = ?cells, "Board advanced past missed moves");
            }
            BoardDelta::Conflict(cells) => {
                warn!(cells = ?cells, "Board resynchronized from server");
            }
        }
        Ok(MatchUpdate::BoardChanged(delta))
    }

    /// Record a forfeit by either side
    pub fn on_forfeited(&mut self, payload: &GameForfeitedPayload) -> ServiceResult<MatchUpdate> {
        if !self.is_current(payload.game_id) || self.is_terminal() {
            return Ok(MatchUpdate::Ignored);
        }
        self.state.record_forfeit(payload.to_result())?;
        self.set_phase(MatchPhase::Terminal);

        let outcome = self.outcome();
        info!(
            game_id = %self.game_id(),
            forfeited_by = %payload.forfeited_by,
            outcome = ?outcome,
            "Match forfeited"
        );
        Ok(MatchUpdate::Finished(outcome))
    }

    fn is_current(&self, game_id: GameId) -> bool {
        if game_id == self.game_id() {
            true
        } else {
            debug!(expected = %self.game_id(), actual = %game_id, "Push for another game");
            false
        }
    }

    fn ensure_in_progress(&self) -> Result<(), DomainError> {
        match self.phase {
            MatchPhase::InProgress => Ok(()),
            MatchPhase::Terminal => Err(DomainError::MatchOver),
            MatchPhase::Loading | MatchPhase::AwaitingJoinAck => {
                Err(DomainError::MatchNotInProgress)
            }
        }
    }

    fn set_phase(&mut self, next: MatchPhase) {
        if self.phase != next {
            debug!(from = ?self.phase, to = ?next, "Match phase changed");
            self.phase = next;
        }
    }
}
