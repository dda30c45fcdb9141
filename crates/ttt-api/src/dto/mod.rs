//! Data transfer objects for the REST API

mod requests;
mod responses;

pub use requests::{LoginRequest, RegisterRequest};
pub use responses::{
    AuthResponse, CurrentUser, ErrorBody, GameHistoryEntry, HealthStatus, HistoryResult,
    LeaderboardEntry, UserStats,
};
