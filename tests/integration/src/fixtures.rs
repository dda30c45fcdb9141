//! Test fixtures and data generators
//!
//! Provides tokens, request bodies and push payloads shared by the
//! integration tests.

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use ttt_common::TokenClaims;
use ttt_core::{Board, GameId, PlayerSlot, Position, ResultKind, Symbol, UserId, WinningLine};
use ttt_gateway::protocol::{GameStartedPayload, MoveMadePayload};

/// Secret the mock backend signs tokens with
pub const JWT_SECRET: &[u8] = b"integration-test-secret";

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Unique, valid username
pub fn unique_username(prefix: &str) -> String {
    format!("{prefix}_{}", unique_suffix())
}

/// Sign an access token the way the backend does
pub fn mint_token(user_id: UserId, username: &str, ttl_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        exp: now + ttl_secs,
        iat: Some(now),
        username: Some(username.to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET),
    )
    .unwrap_or_default()
}

/// `POST /api/register` body as the backend reads it
#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// `POST /api/login` body as the backend reads it
#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

/// `?limit=` query
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Parse a board literal; panics on a malformed fixture
pub fn board(s: &str) -> Board {
    Board::parse(s).unwrap_or_else(|e| panic!("bad board fixture {s}: {e}"))
}

/// Position literal; panics on a malformed fixture
pub fn pos(i: i64) -> Position {
    Position::new(i).unwrap_or_else(|e| panic!("bad position fixture {i}: {e}"))
}

/// Start of a match between two users; player one moves first
pub fn human_match(game_id: GameId, p1: (UserId, &str), p2: (UserId, &str)) -> GameStartedPayload {
    GameStartedPayload {
        game_id,
        player1: PlayerSlot::new(Some(p1.0), p1.1, Symbol::X),
        player2: PlayerSlot::new(Some(p2.0), p2.1, Symbol::O),
        board: Board::empty(),
        current_turn: Some(p1.0),
        is_bot_game: false,
        bot_difficulty: None,
    }
}

/// Start of a bot match; the human moves first
pub fn bot_match(
    game_id: GameId,
    human: (UserId, &str),
    difficulty: ttt_core::BotDifficulty,
) -> GameStartedPayload {
    GameStartedPayload {
        game_id,
        player1: PlayerSlot::new(Some(human.0), human.1, Symbol::X),
        player2: PlayerSlot::new(None, format!("Bot ({difficulty})"), Symbol::O),
        board: Board::empty(),
        current_turn: Some(human.0),
        is_bot_game: true,
        bot_difficulty: Some(difficulty),
    }
}

/// A non-final move
pub fn move_made(
    game_id: GameId,
    position: i64,
    player_id: Option<UserId>,
    board_str: &str,
    current_turn: Option<UserId>,
) -> MoveMadePayload {
    MoveMadePayload {
        game_id,
        position: Some(pos(position)),
        player_id,
        board: board(board_str),
        current_turn,
        game_over: false,
        result: None,
        winner_id: None,
        winning_line: None,
    }
}

/// A winning final move
pub fn winning_move(
    game_id: GameId,
    position: i64,
    winner: UserId,
    board_str: &str,
    line: [i64; 3],
) -> MoveMadePayload {
    MoveMadePayload {
        game_id,
        position: Some(pos(position)),
        player_id: Some(winner),
        board: board(board_str),
        current_turn: None,
        game_over: true,
        result: Some(ResultKind::Win),
        winner_id: Some(winner),
        winning_line: Some(WinningLine::new([pos(line[0]), pos(line[1]), pos(line[2])])),
    }
}
