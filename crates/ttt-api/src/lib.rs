//! # ttt-api
//!
//! Typed client for the backend's REST surface: login and registration,
//! the current user, the leaderboard, own statistics and game history.
//!
//! Requests are validated locally before they are sent; responses are
//! decoded into the DTOs in [`dto`].

pub mod client;
pub mod dto;
pub mod error;

pub use client::ApiClient;
pub use dto::{
    AuthResponse, CurrentUser, GameHistoryEntry, HealthStatus, HistoryResult, LeaderboardEntry,
    LoginRequest, RegisterRequest, UserStats,
};
pub use error::{ApiError, ApiResult};
