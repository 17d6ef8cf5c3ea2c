//! In-memory backends
//!
//! Process-local stand-ins for Redis and Postgres used by tests and local
//! runs without infrastructure.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use crate::domain::cache::Cache;
use crate::domain::entity::user::User;
use crate::domain::repository::{TransactionManager, UnitOfWork};
use crate::domain::value_object::UserId;
use crate::error::{AuthError, AuthResult};

// ============================================================================
// Cache
// ============================================================================

struct ListEntry {
    values: VecDeque<String>,
    expires_at: Option<Instant>,
}

impl ListEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// List cache with lazily enforced key TTLs
#[derive(Clone, Default)]
pub struct MemoryCache {
    lists: Arc<RwLock<HashMap<String, ListEntry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining TTL of a live key
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let lists = self.lists.read();
        let entry = lists.get(key).filter(|e| !e.is_expired(now))?;
        entry.expires_at.map(|at| at.saturating_duration_since(now))
    }

    fn purge_expired(lists: &mut HashMap<String, ListEntry>, key: &str) {
        if lists.get(key).is_some_and(|e| e.is_expired(Instant::now())) {
            lists.remove(key);
        }
    }
}

impl Cache for MemoryCache {
    async fn get_list(&self, key: &str) -> AuthResult<Vec<String>> {
        let now = Instant::now();
        let lists = self.lists.read();
        Ok(lists
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.values.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn push_list(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> AuthResult<()> {
        let mut lists = self.lists.write();
        Self::purge_expired(&mut lists, key);

        let entry = lists.entry(key.to_string()).or_insert_with(|| ListEntry {
            values: VecDeque::new(),
            expires_at: None,
        });
        entry.values.push_front(value.to_string());
        if let Some(ttl) = ttl_secs {
            entry.expires_at = Some(Instant::now() + Duration::from_secs(ttl));
        }
        Ok(())
    }

    async fn remove_from_list(&self, key: &str, value: &str) -> AuthResult<bool> {
        let mut lists = self.lists.write();
        Self::purge_expired(&mut lists, key);

        let Some(entry) = lists.get_mut(key) else {
            return Ok(false);
        };
        let before = entry.values.len();
        entry.values.retain(|v| v != value);
        let removed = entry.values.len() < before;

        // empty lists disappear, as in Redis
        if entry.values.is_empty() {
            lists.remove(key);
        }
        Ok(removed)
    }

    async fn delete_key(&self, key: &str) -> AuthResult<()> {
        self.lists.write().remove(key);
        Ok(())
    }
}

// ============================================================================
// User store
// ============================================================================

/// Transaction counters, for asserting commit/rollback behaviour
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TxLog {
    pub begun: usize,
    pub committed: usize,
    pub rolled_back: usize,
}

/// Shared in-memory user table
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<Vec<User>>>,
    log: Arc<Mutex<TxLog>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let store = Self::new();
        store.users.write().extend(users);
        store
    }

    pub fn insert(&self, user: User) {
        self.users.write().push(user);
    }

    pub fn remove(&self, user_id: &UserId) {
        self.users.write().retain(|u| &u.user_id != user_id);
    }

    pub fn tx_log(&self) -> TxLog {
        *self.log.lock()
    }

    /// Unit of work with no transaction open yet
    pub fn unit(&self) -> MemoryUnitOfWork {
        MemoryUnitOfWork {
            store: self.clone(),
            open: false,
            finished: false,
        }
    }
}

impl TransactionManager for MemoryUserStore {
    type Unit = MemoryUnitOfWork;

    async fn begin(&self) -> AuthResult<MemoryUnitOfWork> {
        let mut unit = self.unit();
        unit.create_transaction().await?;
        Ok(unit)
    }
}

pub struct MemoryUnitOfWork {
    store: MemoryUserStore,
    open: bool,
    finished: bool,
}

impl MemoryUnitOfWork {
    fn ensure_open(&self) -> AuthResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(AuthError::Internal("Transaction not started".to_string()))
        }
    }

    fn finish(&mut self, committed: bool) {
        if self.open && !self.finished {
            let mut log = self.store.log.lock();
            if committed {
                log.committed += 1;
            } else {
                log.rolled_back += 1;
            }
        }
        self.finished = true;
    }
}

impl UnitOfWork for MemoryUnitOfWork {
    async fn create_transaction(&mut self) -> AuthResult<()> {
        if !self.open {
            self.open = true;
            self.store.log.lock().begun += 1;
        }
        Ok(())
    }

    async fn find_user_by_login(&mut self, login: &str) -> AuthResult<Option<User>> {
        self.ensure_open()?;
        let users = self.store.users.read();
        Ok(users.iter().find(|u| u.has_login(login)).cloned())
    }

    async fn find_user_by_id(&mut self, user_id: &UserId) -> AuthResult<Option<User>> {
        self.ensure_open()?;
        let users = self.store.users.read();
        Ok(users.iter().find(|u| &u.user_id == user_id).cloned())
    }

    async fn commit(mut self) -> AuthResult<()> {
        self.finish(true);
        Ok(())
    }

    async fn rollback(mut self) -> AuthResult<()> {
        self.finish(false);
        Ok(())
    }
}

impl Drop for MemoryUnitOfWork {
    fn drop(&mut self) {
        self.finish(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_and_remove() {
        let cache = MemoryCache::new();
        cache.push_list("k", "a", None).await.unwrap();
        cache.push_list("k", "b", None).await.unwrap();
        cache.push_list("k", "a", None).await.unwrap();

        assert_eq!(cache.get_list("k").await.unwrap(), vec!["a", "b", "a"]);

        // every copy goes, like LREM with count 0
        assert!(cache.remove_from_list("k", "a").await.unwrap());
        assert_eq!(cache.get_list("k").await.unwrap(), vec!["b"]);
        assert!(!cache.remove_from_list("k", "a").await.unwrap());
        assert!(!cache.remove_from_list("missing", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_ttl_expires_key() {
        let cache = MemoryCache::new();
        cache.push_list("k", "a", Some(0)).await.unwrap();
        assert!(cache.get_list("k").await.unwrap().is_empty());

        cache.push_list("k", "b", Some(60)).await.unwrap();
        assert_eq!(cache.get_list("k").await.unwrap(), vec!["b"]);
        let ttl = cache.ttl("k").unwrap();
        assert!(ttl <= Duration::from_secs(60) && ttl > Duration::from_secs(55));
    }

    #[tokio::test]
    async fn test_push_resets_ttl() {
        let cache = MemoryCache::new();
        cache.push_list("k", "a", Some(5)).await.unwrap();
        cache.push_list("k", "b", Some(600)).await.unwrap();
        assert!(cache.ttl("k").unwrap() > Duration::from_secs(500));
    }

    #[tokio::test]
    async fn test_delete_key() {
        let cache = MemoryCache::new();
        cache.push_list("k", "a", None).await.unwrap();
        cache.delete_key("k").await.unwrap();
        assert!(cache.get_list("k").await.unwrap().is_empty());
        assert!(cache.ttl("k").is_none());
    }

    #[tokio::test]
    async fn test_create_transaction_is_idempotent() {
        let store = MemoryUserStore::new();
        let mut unit = store.unit();
        unit.create_transaction().await.unwrap();
        unit.create_transaction().await.unwrap();
        unit.commit().await.unwrap();

        assert_eq!(
            store.tx_log(),
            TxLog {
                begun: 1,
                committed: 1,
                rolled_back: 0
            }
        );
    }

    #[tokio::test]
    async fn test_queries_need_open_transaction() {
        let store = MemoryUserStore::new();
        let mut unit = store.unit();
        assert!(unit.find_user_by_login("x").await.is_err());
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let store = MemoryUserStore::new();
        {
            let _unit = store.begin().await.unwrap();
        }
        assert_eq!(store.tx_log().rolled_back, 1);
        assert_eq!(store.tx_log().committed, 0);
    }

    #[tokio::test]
    async fn test_login_lookup_ignores_case() {
        let user = User::new("Alice", "hash");
        let store = MemoryUserStore::with_users([user.clone()]);
        let mut unit = store.begin().await.unwrap();

        let found = unit.find_user_by_login("aLiCe").await.unwrap().unwrap();
        assert_eq!(found.user_id, user.user_id);
        assert!(unit.find_user_by_id(&UserId::new()).await.unwrap().is_none());
        unit.commit().await.unwrap();
    }
}
