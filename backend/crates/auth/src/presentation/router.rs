//! Auth Router

use axum::{
    Router,
    routing::{get, post},
};

use crate::domain::cache::Cache;
use crate::domain::password::PasswordVerifier;
use crate::domain::repository::TransactionManager;
use crate::presentation::handlers::{self, AuthAppState};

/// Login, refresh and logout routes, to be nested under `/v1/auth`
pub fn auth_router<M, C, H>(state: AuthAppState<M, C, H>) -> Router
where
    M: TransactionManager + 'static,
    C: Cache + Send + Sync + 'static,
    H: PasswordVerifier + 'static,
{
    Router::new()
        .route("/login", post(handlers::login::<M, C, H>))
        .route("/refresh", post(handlers::refresh::<M, C, H>))
        .route("/logout", post(handlers::logout::<M, C, H>))
        .with_state(state)
}

/// Versioned API surface: `/v1/auth/*` plus `/v1/healthcheck`
pub fn api_router<M, C, H>(state: AuthAppState<M, C, H>) -> Router
where
    M: TransactionManager + 'static,
    C: Cache + Send + Sync + 'static,
    H: PasswordVerifier + 'static,
{
    Router::new()
        .nest("/v1/auth", auth_router(state))
        .route("/v1/healthcheck", get(handlers::healthcheck))
}
