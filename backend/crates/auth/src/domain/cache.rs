//! Cache Trait
//!
//! The list operations the session registry needs from a key-value cache.
//! Lists are ordered newest first.

use crate::error::AuthResult;

#[trait_variant::make(Cache: Send)]
pub trait LocalCache {
    /// Whole list at `key`; a missing key reads as empty
    async fn get_list(&self, key: &str) -> AuthResult<Vec<String>>;

    /// Push to the front and, when given, reset the key TTL
    async fn push_list(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> AuthResult<()>;

    /// Remove every element equal to `value`; reports whether any was removed
    async fn remove_from_list(&self, key: &str, value: &str) -> AuthResult<bool>;

    async fn delete_key(&self, key: &str) -> AuthResult<()>;
}
