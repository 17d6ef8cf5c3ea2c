//! Redis Cache
//!
//! Session lists live in plain Redis lists. `LPUSH` and `EXPIRE` are sent as
//! one atomic pipeline.

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::domain::cache::Cache;
use crate::error::{AuthError, AuthResult};

/// Redis-backed cache; cloning shares the multiplexed connection
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> AuthResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    /// Round-trip check used at startup
    pub async fn ping(&self) -> AuthResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

impl Cache for RedisCache {
    async fn get_list(&self, key: &str) -> AuthResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let values: Vec<String> = conn.lrange(key, 0, -1).await?;
        Ok(values)
    }

    async fn push_list(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> AuthResult<()> {
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic().lpush(key, value).ignore();
        if let Some(ttl) = ttl_secs {
            let ttl = i64::try_from(ttl)
                .map_err(|_| AuthError::Internal("TTL out of range".to_string()))?;
            pipe.expire(key, ttl).ignore();
        }
        let () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn remove_from_list(&self, key: &str, value: &str) -> AuthResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.lrem(key, 0, value).await?;
        Ok(removed > 0)
    }

    async fn delete_key(&self, key: &str) -> AuthResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(key).await?;
        Ok(())
    }
}
