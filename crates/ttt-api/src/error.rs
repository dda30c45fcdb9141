//! REST client errors

use thiserror::Error;
use ttt_common::{AppError, ErrorCategory};
use validator::ValidationErrors;

/// Errors returned by [`crate::ApiClient`]
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Request rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("HTTP transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

impl ApiError {
    /// HTTP status, when the server answered
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidCredentials(_) | Self::Unauthorized(_) => Some(401),
            Self::Rejected { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Validation(_) | Self::Decode(_) => None,
        }
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::InvalidCredentials(_) | Self::Unauthorized(_) => ErrorCategory::Authentication,
            Self::Rejected { .. } | Self::Decode(_) => ErrorCategory::Server,
            Self::Transport(_) => ErrorCategory::Transport,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err)
        }
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Validation(e) => AppError::Validation(e.to_string()),
            ApiError::InvalidCredentials(_) => AppError::InvalidCredentials,
            ApiError::Unauthorized(detail) => AppError::SessionRejected(detail),
            ApiError::Rejected { detail, .. } => AppError::Server(detail),
            ApiError::Decode(detail) => AppError::Server(detail),
            ApiError::Transport(e) => AppError::Transport(e.to_string()),
        }
    }
}

/// Result type alias for REST calls
pub type ApiResult<T> = Result<T, ApiError>;
