//! Match entity - the locally mirrored state of one server-owned game

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;
use crate::value_objects::{
    Board, BoardDelta, BotDifficulty, GameId, Position, Symbol, UserId, WinningLine,
};

/// One side of a match. A bot opponent has no user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSlot {
    pub id: Option<UserId>,
    pub username: String,
    pub symbol: Symbol,
}

impl PlayerSlot {
    #[must_use]
    pub fn new(id: Option<UserId>, username: impl Into<String>, symbol: Symbol) -> Self {
        Self {
            id,
            username: username.into(),
            symbol,
        }
    }

    #[must_use]
    pub fn is_bot(&self) -> bool {
        self.id.is_none()
    }

    #[must_use]
    pub fn is(&self, user_id: UserId) -> bool {
        self.id == Some(user_id)
    }
}

/// Result kind as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Win,
    Draw,
    Abandoned,
}

impl ResultKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Draw => "draw",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final result of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub kind: ResultKind,
    pub winner_id: Option<UserId>,
    pub winning_line: Option<WinningLine>,
    pub forfeited_by: Option<UserId>,
}

impl MatchResult {
    /// Result of a game that ended on the board
    #[must_use]
    pub fn finished(
        kind: ResultKind,
        winner_id: Option<UserId>,
        winning_line: Option<WinningLine>,
    ) -> Self {
        Self {
            kind,
            winner_id,
            winning_line,
            forfeited_by: None,
        }
    }

    /// Result of a forfeited game
    #[must_use]
    pub fn forfeit(kind: ResultKind, forfeited_by: UserId, winner_id: Option<UserId>) -> Self {
        Self {
            kind,
            winner_id,
            winning_line: None,
            forfeited_by: Some(forfeited_by),
        }
    }
}

/// How a finished match reads from the local user's seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Victory,
    Defeat,
    Draw,
    /// The local user forfeited
    Forfeited,
    /// The opponent forfeited
    OpponentForfeited,
}

impl Outcome {
    #[must_use]
    pub const fn headline(self) -> &'static str {
        match self {
            Self::Victory => "You won!",
            Self::Defeat => "You lost",
            Self::Draw => "It's a draw",
            Self::Forfeited => "You forfeited",
            Self::OpponentForfeited => "Opponent forfeited, you win!",
        }
    }

    #[must_use]
    pub const fn is_win(self) -> bool {
        matches!(self, Self::Victory | Self::OpponentForfeited)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.headline())
    }
}

/// Mirror of one match
///
/// Only server pushes mutate the board. Turn ownership always names one of
/// the two slots while the match is live (`None` is the bot's slot), and
/// once terminal the state is frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    game_id: GameId,
    player1: PlayerSlot,
    player2: PlayerSlot,
    board: Board,
    turn_owner: Option<UserId>,
    terminal: bool,
    result: Option<MatchResult>,
    bot_difficulty: Option<BotDifficulty>,
    #[serde(default)]
    moves_applied: u32,
}

impl MatchState {
    /// Create the state announced by a match-start push
    pub fn new(
        game_id: GameId,
        player1: PlayerSlot,
        player2: PlayerSlot,
        board: Board,
        turn_owner: Option<UserId>,
    ) -> Result<Self, DomainError> {
        let state = Self {
            game_id,
            player1,
            player2,
            board,
            turn_owner,
            terminal: false,
            result: None,
            bot_difficulty: None,
            moves_applied: 0,
        };
        if !state.owns_slot(turn_owner) {
            return Err(DomainError::InvalidTurnOwner(turn_owner));
        }
        Ok(state)
    }

    /// Set the bot difficulty
    #[must_use]
    pub fn with_bot_difficulty(mut self, difficulty: Option<BotDifficulty>) -> Self {
        self.bot_difficulty = difficulty;
        self
    }

    #[must_use]
    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    #[must_use]
    pub fn player1(&self) -> &PlayerSlot {
        &self.player1
    }

    #[must_use]
    pub fn player2(&self) -> &PlayerSlot {
        &self.player2
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn turn_owner(&self) -> Option<UserId> {
        self.turn_owner
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    #[must_use]
    pub fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn bot_difficulty(&self) -> Option<BotDifficulty> {
        self.bot_difficulty
    }

    /// Number of single-cell moves accepted so far
    #[must_use]
    pub fn moves_applied(&self) -> u32 {
        self.moves_applied
    }

    #[must_use]
    pub fn is_bot_game(&self) -> bool {
        self.player1.is_bot() || self.player2.is_bot()
    }

    /// Slot held by `user_id`
    #[must_use]
    pub fn slot_of(&self, user_id: UserId) -> Option<&PlayerSlot> {
        [&self.player1, &self.player2]
            .into_iter()
            .find(|slot| slot.is(user_id))
    }

    /// Slot facing `user_id`
    #[must_use]
    pub fn opponent_of(&self, user_id: UserId) -> Option<&PlayerSlot> {
        if self.player1.is(user_id) {
            Some(&self.player2)
        } else if self.player2.is(user_id) {
            Some(&self.player1)
        } else {
            None
        }
    }

    /// Whether `user_id` may move now
    #[must_use]
    pub fn is_turn_of(&self, user_id: UserId) -> bool {
        !self.terminal && self.turn_owner == Some(user_id)
    }

    /// Local legality check for a move by `user_id`
    pub fn check_move(&self, user_id: UserId, position: Position) -> Result<(), DomainError> {
        if self.terminal {
            return Err(DomainError::MatchOver);
        }
        if !self.is_turn_of(user_id) {
            return Err(DomainError::NotYourTurn);
        }
        if !self.board.is_empty_at(position) {
            return Err(DomainError::CellTaken(position));
        }
        Ok(())
    }

    /// Apply a confirmed, non-final move.
    ///
    /// A stale board leaves the state untouched.
    pub fn apply_move(
        &mut self,
        board: Board,
        turn_owner: Option<UserId>,
    ) -> Result<BoardDelta, DomainError> {
        if self.terminal {
            return Err(DomainError::MatchOver);
        }
        if !self.owns_slot(turn_owner) {
            return Err(DomainError::InvalidTurnOwner(turn_owner));
        }

        let delta = self.board.delta(&board);
        match &delta {
            BoardDelta::Stale => return Ok(delta),
            BoardDelta::Move(_) => self.moves_applied += 1,
            BoardDelta::Advance(cells) => {
                self.moves_applied += u32::try_from(cells.len()).unwrap_or(u32::MAX);
            }
            BoardDelta::Unchanged | BoardDelta::Conflict(_) => {}
        }
        self.board = board;
        self.turn_owner = turn_owner;
        Ok(delta)
    }

    /// Record the final board and result; the state becomes terminal
    pub fn conclude(
        &mut self,
        board: Board,
        result: Option<MatchResult>,
    ) -> Result<BoardDelta, DomainError> {
        if self.terminal {
            return Err(DomainError::MatchOver);
        }
        let delta = self.board.delta(&board);
        if let BoardDelta::Move(_) = delta {
            self.moves_applied += 1;
        }
        self.board = board;
        self.terminal = true;
        self.result = result;
        Ok(delta)
    }

    /// Record a forfeit; the board is left as it was
    pub fn record_forfeit(&mut self, result: MatchResult) -> Result<(), DomainError> {
        if self.terminal {
            return Err(DomainError::MatchOver);
        }
        self.terminal = true;
        self.result = Some(result);
        Ok(())
    }

    /// Framing of the result for `user_id`
    #[must_use]
    pub fn outcome_for(&self, user_id: UserId) -> Option<Outcome> {
        let result = self.result.as_ref()?;
        if let Some(forfeited_by) = result.forfeited_by {
            return Some(if forfeited_by == user_id {
                Outcome::Forfeited
            } else {
                Outcome::OpponentForfeited
            });
        }
        Some(match result.kind {
            ResultKind::Draw => Outcome::Draw,
            ResultKind::Win | ResultKind::Abandoned => {
                if result.winner_id == Some(user_id) {
                    Outcome::Victory
                } else {
                    Outcome::Defeat
                }
            }
        })
    }

    /// Cells flagged by the winning line, if any
    #[must_use]
    pub fn highlighted(&self) -> Vec<Position> {
        self.result
            .as_ref()
            .and_then(|r| r.winning_line)
            .map(|line| line.cells().to_vec())
            .unwrap_or_default()
    }

    fn owns_slot(&self, turn_owner: Option<UserId>) -> bool {
        self.player1.id == turn_owner || self.player2.id == turn_owner
    }
}
