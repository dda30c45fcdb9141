//! Service layer error types
//!
//! Provides a unified error type for coordinator and runtime operations.

use std::fmt;
use ttt_api::ApiError;
use ttt_common::{AppError, ErrorCategory};
use ttt_core::DomainError;
use ttt_gateway::GatewayError;

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// Local precondition or state violation
    Domain(DomainError),

    /// Application error (token, config, etc.)
    App(AppError),

    /// Connection failure or refused command
    Gateway(GatewayError),

    /// REST call failure
    Api(ApiError),

    /// Operation needs a session and there is none
    NotLoggedIn,

    /// Validation error
    Validation(String),

    /// Internal error
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => write!(f, "{e}"),
            Self::App(e) => write!(f, "{e}"),
            Self::Gateway(e) => write!(f, "{e}"),
            Self::Api(e) => write!(f, "{e}"),
            Self::NotLoggedIn => write!(f, "Not logged in"),
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            Self::App(e) => Some(e),
            Self::Gateway(e) => Some(e),
            Self::Api(e) => Some(e),
            _ => None,
        }
    }
}

impl ServiceError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// How the runtime should treat this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => {
                if e.is_infrastructure() {
                    ErrorCategory::Storage
                } else {
                    ErrorCategory::Validation
                }
            }
            Self::App(e) => e.category(),
            Self::Gateway(e) => e.category(),
            Self::Api(e) => e.category(),
            Self::NotLoggedIn => ErrorCategory::Authentication,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Get the error code for notifications and logs
    pub fn error_code(&self) -> &str {
        match self {
            Self::Domain(e) => e.code(),
            Self::App(e) => e.error_code(),
            Self::Gateway(e) => match e {
                GatewayError::SessionRevoked => "SESSION_REVOKED",
                GatewayError::NotAuthenticated => "NOT_AUTHENTICATED",
                GatewayError::Protocol(_) => "PROTOCOL_ERROR",
                _ => "CONNECTION_ERROR",
            },
            Self::Api(e) => match e.category() {
                ErrorCategory::Validation => "VALIDATION_ERROR",
                ErrorCategory::Authentication => "UNAUTHORIZED",
                ErrorCategory::Transport => "HTTP_TRANSPORT_ERROR",
                _ => "REQUEST_REJECTED",
            },
            Self::NotLoggedIn => "NOT_LOGGED_IN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the user must log in again
    pub fn requires_login(&self) -> bool {
        self.category() == ErrorCategory::Authentication
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<AppError> for ServiceError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<GatewayError> for ServiceError {
    fn from(err: GatewayError) -> Self {
        Self::Gateway(err)
    }
}

impl From<ApiError> for ServiceError {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => AppError::Domain(e),
            ServiceError::App(e) => e,
            ServiceError::Gateway(e) => e.into(),
            ServiceError::Api(e) => e.into(),
            ServiceError::NotLoggedIn => AppError::MissingSession,
            ServiceError::Validation(msg) => AppError::Validation(msg),
            ServiceError::Internal(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ttt_core::Position;

    #[test]
    fn test_domain_validation_error() {
        let err = ServiceError::from(DomainError::CellTaken(Position::new(4).unwrap()));
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.error_code(), "CELL_TAKEN");
        assert!(!err.requires_login());
    }

    #[test]
    fn test_storage_error() {
        let err = ServiceError::from(DomainError::StorageError("disk full".to_string()));
        assert_eq!(err.category(), ErrorCategory::Storage);
    }

    #[test]
    fn test_revoked_session_requires_login() {
        let err = ServiceError::from(GatewayError::SessionRevoked);
        assert!(err.requires_login());
        assert_eq!(err.error_code(), "SESSION_REVOKED");
        assert!(ServiceError::NotLoggedIn.requires_login());
    }

    #[test]
    fn test_convert_to_app_error() {
        let app: AppError = ServiceError::NotLoggedIn.into();
        assert!(matches!(app, AppError::MissingSession));

        let app: AppError = ServiceError::validation("bad").into();
        assert_eq!(app.category(), ErrorCategory::Validation);
    }
}
