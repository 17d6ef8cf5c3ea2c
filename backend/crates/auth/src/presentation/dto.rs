//! API DTOs (Data Transfer Objects)

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Requests
// ============================================================================

/// POST /v1/auth/login body
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
    pub fingerprint: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

/// POST /v1/auth/refresh body
#[derive(Debug, Clone, Deserialize)]
pub struct FingerprintRequest {
    pub fingerprint: String,
}

// ============================================================================
// Responses
// ============================================================================

/// Access token body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthcheckResponse {
    pub ok: bool,
}
