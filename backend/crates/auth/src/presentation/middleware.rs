//! Auth Middleware
//!
//! Bearer access-token check for protected routes.

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::{HeaderMap, Request, header, request::Parts};
use axum::middleware::Next;
use axum::response::Response;

use crate::application::token::TokenType;
use crate::domain::cache::Cache;
use crate::domain::password::PasswordVerifier;
use crate::domain::repository::TransactionManager;
use crate::domain::value_object::UserId;
use crate::error::AuthError;
use crate::presentation::handlers::AuthAppState;

/// Caller identity stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub login: String,
}

/// Middleware that requires `Authorization: Bearer <access token>`
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn require_access_token<M, C, H>(
    State(state): State<AuthAppState<M, C, H>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError>
where
    M: TransactionManager + 'static,
    C: Cache + Send + Sync + 'static,
    H: PasswordVerifier + 'static,
{
    let token = bearer_token(req.headers()).ok_or(AuthError::Unauthorized)?;

    let user = state
        .service
        .authenticate(&token, TokenType::Access)
        .await
        .map_err(|e| {
            if e.kind().is_server_error() {
                e
            } else {
                AuthError::Unauthorized
            }
        })?;

    req.extensions_mut().insert(AuthenticatedUser {
        user_id: user.user_id,
        login: user.login,
    });

    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthError::Unauthorized)
    }
}
