//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::{AuthService, IssuedTokens, LoginInput};
use crate::domain::cache::Cache;
use crate::domain::password::PasswordVerifier;
use crate::domain::repository::TransactionManager;
use crate::domain::value_object::Fingerprint;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    FingerprintRequest, HealthcheckResponse, LoginRequest, StatusResponse, TokenResponse,
};

/// Shared state for auth handlers
pub struct AuthAppState<M, C, H> {
    pub service: Arc<AuthService<M, C, H>>,
    pub config: Arc<AuthConfig>,
}

impl<M, C, H> AuthAppState<M, C, H> {
    pub fn new(service: AuthService<M, C, H>, config: AuthConfig) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
        }
    }
}

impl<M, C, H> Clone for AuthAppState<M, C, H> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            config: Arc::clone(&self.config),
        }
    }
}

// ============================================================================
// Login
// ============================================================================

/// POST /v1/auth/login
pub async fn login<M, C, H>(
    State(state): State<AuthAppState<M, C, H>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Response>
where
    M: TransactionManager + 'static,
    C: Cache + Send + Sync + 'static,
    H: PasswordVerifier + 'static,
{
    let fingerprint = Fingerprint::new(req.fingerprint)?;

    let input = LoginInput {
        login: req.login,
        password: ClearTextPassword::new(req.password),
        fingerprint,
    };

    let tokens = state.service.login(input).await?;

    token_response(&state.config, tokens)
}

// ============================================================================
// Refresh
// ============================================================================

/// POST /v1/auth/refresh
pub async fn refresh<M, C, H>(
    State(state): State<AuthAppState<M, C, H>>,
    headers: HeaderMap,
    Json(req): Json<FingerprintRequest>,
) -> AuthResult<Response>
where
    M: TransactionManager + 'static,
    C: Cache + Send + Sync + 'static,
    H: PasswordVerifier + 'static,
{
    let fingerprint = Fingerprint::new(req.fingerprint)?;
    let token = refresh_cookie(&state.config, &headers);

    let tokens = state.service.refresh(&fingerprint, &token).await?;

    token_response(&state.config, tokens)
}

// ============================================================================
// Logout
// ============================================================================

/// POST /v1/auth/logout
pub async fn logout<M, C, H>(
    State(state): State<AuthAppState<M, C, H>>,
    headers: HeaderMap,
) -> AuthResult<Response>
where
    M: TransactionManager + 'static,
    C: Cache + Send + Sync + 'static,
    H: PasswordVerifier + 'static,
{
    let token = refresh_cookie(&state.config, &headers);

    let status = state.service.logout(&token).await?;

    let cookie = state
        .config
        .refresh_cookie()
        .delete_cookie_header()
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(StatusResponse {
            success: status.success,
        }),
    )
        .into_response())
}

// ============================================================================
// Healthcheck
// ============================================================================

/// GET /v1/healthcheck
pub async fn healthcheck() -> Json<HealthcheckResponse> {
    Json(HealthcheckResponse { ok: true })
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Missing cookie reads as an empty token, which never verifies
fn refresh_cookie(config: &AuthConfig, headers: &HeaderMap) -> String {
    platform::cookie::extract_cookie(headers, &config.refresh_cookie_name).unwrap_or_default()
}

fn token_response(config: &AuthConfig, tokens: IssuedTokens) -> AuthResult<Response> {
    let cookie = config
        .refresh_cookie()
        .set_cookie_header(&tokens.refresh_token, tokens.refresh_max_age)
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(TokenResponse {
            token: tokens.access_token,
        }),
    )
        .into_response())
}
