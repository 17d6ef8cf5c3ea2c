//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown login or wrong password (indistinguishable on purpose)
    #[error("Incorrect login or password")]
    InvalidCredentials,

    /// Signature, expiry or claims check failed
    #[error("Token is invalid or expired")]
    TokenInvalid,

    /// Valid token of the wrong type, or its subject no longer exists
    #[error("Unauthorized")]
    Unauthorized,

    /// Refresh token not registered for this fingerprint; all sessions wiped
    #[error("Current token is not valid anymore")]
    SessionRevoked,

    /// Logout with a token that is not registered
    #[error("Invalid token")]
    UnknownToken,

    #[error("Fingerprint must not contain \"::\"")]
    InvalidFingerprint,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials
            | AuthError::TokenInvalid
            | AuthError::Unauthorized
            | AuthError::SessionRevoked
            | AuthError::UnknownToken => ErrorKind::Unauthorized,
            AuthError::InvalidFingerprint => ErrorKind::BadRequest,
            AuthError::Configuration(_)
            | AuthError::Database(_)
            | AuthError::Cache(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    ///
    /// Server-side failures are reported with a generic message only; the
    /// driver error stays attached as the source.
    pub fn into_app_error(self) -> AppError {
        let kind = self.kind();
        if kind.is_server_error() {
            let err = AppError::new(kind, "Internal server error");
            return match self {
                AuthError::Database(e) => err.with_source(e),
                AuthError::Cache(e) => err.with_source(e),
                other => err.with_source(other.to_string()),
            };
        }

        let err = AppError::new(kind, self.to_string());
        match self {
            AuthError::SessionRevoked => err.with_action("Sign in again"),
            _ => err,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Cache(e) => {
                tracing::error!(error = %e, "Auth cache error");
            }
            AuthError::Configuration(msg) => {
                tracing::error!(message = %msg, "Auth configuration error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::SessionRevoked => {
                tracing::warn!("Refresh token replay detected");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.into_app_error().into_response()
    }
}
