//! Session Registry
//!
//! Per-user list of `fingerprint::refresh_token` entries kept in the cache
//! under `auth:{user_id_hex}`. The cache is the only source of truth, so
//! the size check in [`SessionRegistry::register`] is not atomic with the
//! push that follows it.

use crate::domain::cache::Cache;
use crate::domain::value_object::{SessionEntry, UserId};
use crate::error::AuthResult;

const KEY_PREFIX: &str = "auth:";

pub struct SessionRegistry<C> {
    cache: C,
    max_sessions: usize,
}

impl<C: Cache + Sync> SessionRegistry<C> {
    pub fn new(cache: C, max_sessions: usize) -> Self {
        Self {
            cache,
            max_sessions,
        }
    }

    pub fn key(user_id: &UserId) -> String {
        format!("{KEY_PREFIX}{}", user_id.to_hex())
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Add a session, wiping all existing ones first when the cap is reached
    ///
    /// The key TTL is reset to `ttl_secs` (the new token's remaining life).
    pub async fn register(
        &self,
        user_id: &UserId,
        fingerprint: &str,
        refresh_token: &str,
        ttl_secs: u64,
    ) -> AuthResult<()> {
        let key = Self::key(user_id);

        let existing = self.cache.get_list(&key).await?;
        if existing.len() >= self.max_sessions {
            tracing::warn!(
                user_id = %user_id,
                sessions = existing.len(),
                "Session cap reached, revoking all sessions"
            );
            self.cache.delete_key(&key).await?;
        }

        let entry = SessionEntry::new(fingerprint, refresh_token).encode();
        self.cache.push_list(&key, &entry, Some(ttl_secs)).await?;

        tracing::debug!(user_id = %user_id, "Session registered");
        Ok(())
    }

    /// Consume the entry matching both fingerprint and token
    ///
    /// A non-empty list without a match means the token was replayed or
    /// leaked, so every session of the user is dropped. Losing a concurrent
    /// remove counts as replay too.
    pub async fn find_and_consume(
        &self,
        user_id: &UserId,
        fingerprint: &str,
        refresh_token: &str,
    ) -> AuthResult<bool> {
        let key = Self::key(user_id);

        let entries = self.cache.get_list(&key).await?;
        if entries.is_empty() {
            return Ok(false);
        }

        let found = entries.iter().find(|raw| {
            SessionEntry::parse(raw)
                .is_some_and(|entry| entry.matches(fingerprint, refresh_token))
        });

        if let Some(raw) = found {
            if self.cache.remove_from_list(&key, raw).await? {
                return Ok(true);
            }
            tracing::warn!(user_id = %user_id, "Refresh token consumed concurrently");
        } else {
            tracing::warn!(user_id = %user_id, "Unknown refresh token for fingerprint");
        }

        self.cache.delete_key(&key).await?;
        Ok(false)
    }

    /// Remove the entry holding `refresh_token`, whatever its fingerprint
    pub async fn revoke(&self, user_id: &UserId, refresh_token: &str) -> AuthResult<bool> {
        let key = Self::key(user_id);

        let entries = self.cache.get_list(&key).await?;
        let found = entries.iter().find(|raw| {
            SessionEntry::parse(raw).is_some_and(|entry| entry.matches_token(refresh_token))
        });

        match found {
            Some(raw) => self.cache.remove_from_list(&key, raw).await,
            None => Ok(false),
        }
    }

    /// Number of registered sessions
    pub async fn count(&self, user_id: &UserId) -> AuthResult<usize> {
        Ok(self.cache.get_list(&Self::key(user_id)).await?.len())
    }
}
