//! Application error types
//!
//! Unified error handling for the client. Every failure maps onto one
//! `ErrorCategory`, which decides how the runtime reacts to it.

use serde::Serialize;
use std::fmt;
use ttt_core::DomainError;

/// How a failure is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Local precondition failure; nothing was sent
    Validation,
    /// Session rejected; forces a fresh login
    Authentication,
    /// Server lost our session; one automatic re-authenticate
    TransientAuth,
    /// Connection or HTTP transport failure
    Transport,
    /// Error reported by the backend; state unchanged
    Server,
    /// Client-local persistence failure
    Storage,
    Configuration,
    Internal,
}

impl ErrorCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authentication => "authentication",
            Self::TransientAuth => "transient_auth",
            Self::Transport => "transport",
            Self::Server => "server",
            Self::Storage => "storage",
            Self::Configuration => "configuration",
            Self::Internal => "internal",
        }
    }

    /// Whether the session survives an error of this category
    #[must_use]
    pub const fn keeps_session(self) -> bool {
        !matches!(self, Self::Authentication)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Not logged in")]
    MissingSession,

    #[error("Session rejected: {0}")]
    SessionRejected(String),

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Remote errors
    #[error("Server error: {0}")]
    Server(String),

    #[error("Transport error: {0}")]
    Transport(String),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AppError {
    /// Category this error falls into
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidCredentials
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::MissingSession
            | Self::SessionRejected(_) => ErrorCategory::Authentication,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Server(_) => ErrorCategory::Server,
            Self::Transport(_) => ErrorCategory::Transport,
            Self::Storage(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Configuration,
            Self::Internal(_) => ErrorCategory::Internal,
            Self::Domain(e) => {
                if e.is_validation() || e.is_state() {
                    ErrorCategory::Validation
                } else if matches!(e, DomainError::StorageError(_)) {
                    ErrorCategory::Storage
                } else {
                    ErrorCategory::Internal
                }
            }
        }
    }

    /// Get error code
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::MissingSession => "MISSING_SESSION",
            Self::SessionRejected(_) => "SESSION_REJECTED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Server(_) => "SERVER_ERROR",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Whether the user must log in again
    #[must_use]
    pub fn requires_login(&self) -> bool {
        self.category() == ErrorCategory::Authentication
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
