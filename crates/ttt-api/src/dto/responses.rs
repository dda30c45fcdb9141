//! Response DTOs
//!
//! Optional and defaulted fields follow what the backend actually emits;
//! for example own stats omit the streak fields for a user with no games.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use ttt_core::{GameId, Session, UserId};

/// Successful login or registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user_id: UserId,
    pub username: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl AuthResponse {
    /// Session this response establishes
    #[must_use]
    pub fn into_session(self) -> Session {
        Session::new(self.user_id, self.username, self.access_token)
    }
}

/// `GET /api/users/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub username: String,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Percentage, one decimal
    pub win_rate: f64,
    pub ranking_points: i32,
    #[serde(default)]
    pub best_streak: u32,
}

/// Own statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_games: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub win_rate: f64,
    pub ranking_points: i32,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub best_streak: u32,
}

/// Result of a finished game from the requesting user's seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryResult {
    Win,
    Loss,
    Draw,
}

/// One finished game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameHistoryEntry {
    pub game_id: GameId,
    pub opponent: String,
    pub result: HistoryResult,
    #[serde(default)]
    pub is_bot_game: bool,
    /// ISO-8601, with or without an offset
    #[serde(default)]
    pub finished_at: Option<String>,
}

impl GameHistoryEntry {
    /// Parsed finish time, if present and well formed
    #[must_use]
    pub fn finished_at_naive(&self) -> Option<NaiveDateTime> {
        let raw = self.finished_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.naive_utc())
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
    }
}

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthStatus {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Error body (`{"detail": ...}`)
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    /// Human-readable detail; validation errors arrive as a list of objects
    #[must_use]
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}
