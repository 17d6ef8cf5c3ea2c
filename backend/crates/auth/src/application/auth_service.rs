//! Auth Service
//!
//! Login, refresh, logout and bearer authentication. Each call runs inside
//! one unit of work; only the cache is written.

use chrono::{DateTime, Utc};
use platform::password::ClearTextPassword;
use serde::Serialize;

use crate::application::session_registry::SessionRegistry;
use crate::application::token::{TokenCodec, TokenPayload, TokenType};
use crate::application::transaction;
use crate::domain::cache::Cache;
use crate::domain::entity::user::User;
use crate::domain::password::PasswordVerifier;
use crate::domain::repository::{TransactionManager, UnitOfWork};
use crate::domain::value_object::{Fingerprint, UserId};
use crate::error::{AuthError, AuthResult};

/// Login input
pub struct LoginInput {
    pub login: String,
    pub password: ClearTextPassword,
    pub fingerprint: Fingerprint,
}

/// Freshly minted token pair
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
    /// Remaining refresh lifetime in whole seconds, rounded up
    pub refresh_max_age: u64,
}

/// Outcome of a logout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Status {
    pub success: bool,
}

pub struct AuthService<M, C, H> {
    manager: M,
    registry: SessionRegistry<C>,
    hasher: H,
    codec: TokenCodec,
}

impl<M, C, H> AuthService<M, C, H>
where
    M: TransactionManager,
    C: Cache + Sync,
    H: PasswordVerifier,
{
    pub fn new(manager: M, cache: C, hasher: H, codec: TokenCodec, max_sessions: usize) -> Self {
        Self {
            manager,
            registry: SessionRegistry::new(cache, max_sessions),
            hasher,
            codec,
        }
    }

    pub fn registry(&self) -> &SessionRegistry<C> {
        &self.registry
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Verify credentials and open a new session
    pub async fn login(&self, input: LoginInput) -> AuthResult<IssuedTokens> {
        let mut unit = self.manager.begin().await?;
        let result = self.login_in(&mut unit, input).await;
        transaction::finish(unit, result).await
    }

    async fn login_in(&self, unit: &mut M::Unit, input: LoginInput) -> AuthResult<IssuedTokens> {
        let user = unit.find_user_by_login(&input.login).await?;

        let user = match user {
            Some(user) if self.hasher.verify_password(&user.password_hash, &input.password) => user,
            _ => return Err(AuthError::InvalidCredentials),
        };

        let tokens = self.issue(&user.user_id, &input.fingerprint).await?;
        tracing::info!(
            user_id = %user.user_id,
            expires_at = %tokens.refresh_expires_at,
            "User logged in"
        );
        Ok(tokens)
    }

    /// Rotate a refresh token bound to `fingerprint`
    pub async fn refresh(
        &self,
        fingerprint: &Fingerprint,
        refresh_token: &str,
    ) -> AuthResult<IssuedTokens> {
        let mut unit = self.manager.begin().await?;
        let result = self.refresh_in(&mut unit, fingerprint, refresh_token).await;
        transaction::finish(unit, result).await
    }

    async fn refresh_in(
        &self,
        unit: &mut M::Unit,
        fingerprint: &Fingerprint,
        refresh_token: &str,
    ) -> AuthResult<IssuedTokens> {
        let (user, _) = self
            .authenticate_in(unit, refresh_token, TokenType::Refresh)
            .await?;

        let consumed = self
            .registry
            .find_and_consume(&user.user_id, fingerprint.as_str(), refresh_token)
            .await?;
        if !consumed {
            return Err(AuthError::SessionRevoked);
        }

        let tokens = self.issue(&user.user_id, fingerprint).await?;
        tracing::info!(
            user_id = %user.user_id,
            expires_at = %tokens.refresh_expires_at,
            "Session refreshed"
        );
        Ok(tokens)
    }

    /// End the session holding `refresh_token`
    pub async fn logout(&self, refresh_token: &str) -> AuthResult<Status> {
        let mut unit = self.manager.begin().await?;
        let result = self.logout_in(&mut unit, refresh_token).await;
        transaction::finish(unit, result).await
    }

    async fn logout_in(&self, unit: &mut M::Unit, refresh_token: &str) -> AuthResult<Status> {
        let (user, _) = self
            .authenticate_in(unit, refresh_token, TokenType::Refresh)
            .await?;

        if !self.registry.revoke(&user.user_id, refresh_token).await? {
            return Err(AuthError::UnknownToken);
        }

        tracing::info!(user_id = %user.user_id, "User logged out");
        Ok(Status { success: true })
    }

    /// Resolve the user behind a token of the expected type
    pub async fn authenticate(&self, token: &str, expected: TokenType) -> AuthResult<User> {
        let mut unit = self.manager.begin().await?;
        let result = self.authenticate_in(&mut unit, token, expected).await;
        transaction::finish(unit, result).await.map(|(user, _)| user)
    }

    async fn authenticate_in(
        &self,
        unit: &mut M::Unit,
        token: &str,
        expected: TokenType,
    ) -> AuthResult<(User, TokenPayload)> {
        let payload = self.codec.decode(token)?;
        let user_id = payload.subject_id()?;

        let user = unit.find_user_by_id(&user_id).await?;

        match user {
            Some(user) if payload.is(expected) => Ok((user, payload)),
            _ => Err(AuthError::Unauthorized),
        }
    }

    async fn issue(&self, user_id: &UserId, fingerprint: &Fingerprint) -> AuthResult<IssuedTokens> {
        let subject = user_id.to_hex();

        let (refresh_expires_at, refresh_token) =
            self.codec.encode(&subject, TokenType::Refresh)?;
        let (_, access_token) = self.codec.encode(&subject, TokenType::Access)?;

        let refresh_max_age = remaining_secs(refresh_expires_at, Utc::now());

        self.registry
            .register(user_id, fingerprint.as_str(), &refresh_token, refresh_max_age)
            .await?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            refresh_expires_at,
            refresh_max_age,
        })
    }
}

/// Whole seconds until `expires_at`, rounded up and never below one
fn remaining_secs(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (expires_at - now).num_milliseconds().max(0) as u64;
    millis.div_ceil(1000).max(1)
}
