//! Trait for the key-value store every service persists through.

use crate::error::AppError;
use async_trait::async_trait;

/// Result type for store commands.
pub type StoreResult<T> = Result<T, AppError>;

/// Key-value store interface with Redis command semantics.
///
/// Each method is a single command and atomic on its own key. Nothing here
/// spans several keys atomically; callers sequence multi-key updates
/// themselves.
///
/// # Implementations
///
/// - [`crate::infrastructure::kv::RedisStore`] - Redis over a `ConnectionManager`
/// - [`crate::infrastructure::kv::MemoryStore`] - In-process store for tests and local runs
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// `GET`. Returns `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// `SET` without expiry.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// `SET NX`. Returns `true` if the value was written.
    async fn set_nx(&self, key: &str, value: &str) -> StoreResult<bool>;

    /// `EXISTS` for a single key.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// `DEL`. Returns the number of keys removed.
    async fn del(&self, keys: &[String]) -> StoreResult<u64>;

    /// `HGET`. Returns `Ok(None)` when the hash or field is absent.
    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>>;

    /// `HSET` for a single field.
    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()>;

    /// `HSETNX`. Returns `true` if the field was written.
    async fn hset_nx(&self, key: &str, field: &str, value: &str) -> StoreResult<bool>;

    /// `HEXISTS`.
    async fn hexists(&self, key: &str, field: &str) -> StoreResult<bool>;

    /// `ZADD`. Re-adding an existing member only updates its score.
    async fn zadd(&self, key: &str, member: &str, score: f64) -> StoreResult<()>;

    /// `ZREM`. Returns `true` if the member was present.
    async fn zrem(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// `ZRANGE` by rank, lowest score first. Negative indices count from the end.
    async fn zrange(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>>;

    /// `ZREVRANGE` by rank, highest score first.
    async fn zrevrange(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>>;

    /// `ZCARD`.
    async fn zcard(&self, key: &str) -> StoreResult<u64>;

    /// `ZSCORE`: `None` if the member is absent.
    async fn zscore(&self, key: &str, member: &str) -> StoreResult<Option<f64>>;

    /// `LPUSH` of a single element.
    async fn lpush(&self, key: &str, value: &str) -> StoreResult<()>;

    /// `LRANGE`. Negative indices count from the end.
    async fn lrange(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>>;

    /// Every key matching a glob `pattern`, collected with `SCAN MATCH`.
    async fn scan_match(&self, pattern: &str) -> StoreResult<Vec<String>>;

    /// Returns true if the store answers `PING`.
    async fn health_check(&self) -> bool;
}
