//! Infrastructure Layer
//!
//! Database and cache implementations of the domain traits.

pub mod memory;
pub mod password;
pub mod postgres;
pub mod redis_cache;

pub use memory::{MemoryCache, MemoryUserStore};
pub use postgres::{PgTransactionManager, PgUnitOfWork};
pub use redis_cache::RedisCache;
