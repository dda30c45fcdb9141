//! Access token inspection
//!
//! The client never holds the signing secret, so claims are read without
//! signature verification. This is only used to avoid a doomed handshake
//! with an expired or mismatched token; the backend still verifies it.

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use ttt_core::UserId;

use crate::error::AppError;

/// Claims carried by the backend's access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID as a decimal string)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
}

impl TokenClaims {
    /// Get the user ID
    ///
    /// # Errors
    /// Returns an error if the subject is not a numeric id
    pub fn user_id(&self) -> Result<UserId, AppError> {
        UserId::parse(&self.sub).map_err(|_| AppError::InvalidToken)
    }

    /// Check if the token is expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Seconds until expiry (negative once expired)
    #[must_use]
    pub fn expires_in(&self) -> i64 {
        self.exp - Utc::now().timestamp()
    }
}

/// Decode the claims of an access token without verifying its signature
///
/// # Errors
/// Returns `InvalidToken` if the token is malformed
pub fn inspect_token(token: &str) -> Result<TokenClaims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Failed to decode access token");
            AppError::InvalidToken
        })
}
