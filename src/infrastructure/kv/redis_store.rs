//! Redis-backed key-value store.

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info};

use crate::domain::repositories::{KeyValueStore, StoreResult};
use crate::error::{AppError, map_store_error};
use serde_json::json;

/// Keys requested per `SCAN` round trip.
const SCAN_BATCH: usize = 500;

/// Redis implementation of [`KeyValueStore`].
///
/// Uses `ConnectionManager`, which multiplexes one connection and reconnects
/// on failure. Cloning the manager is cheap, so every command works on its own
/// clone and the store can be shared across tasks without locking.
#[derive(Clone)]
pub struct RedisStore {
    client: ConnectionManager,
}

impl RedisStore {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Infrastructure`] if the URL is invalid, the
    /// connection cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            AppError::infrastructure(
                "Failed to create Redis client",
                json!({ "reason": e.to_string() }),
            )
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            AppError::infrastructure(
                "Failed to connect to Redis",
                json!({ "reason": e.to_string() }),
            )
        })?;

        let mut test_conn = manager.clone();
        test_conn.ping::<()>().await.map_err(|e| {
            AppError::infrastructure("Redis PING failed", json!({ "reason": e.to_string() }))
        })?;

        info!("✓ Connected to Redis");

        Ok(Self { client: manager })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.client.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| map_store_error("GET", key, e))
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.client.clone();
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(|e| map_store_error("SET", key, e))
    }

    async fn set_nx(&self, key: &str, value: &str) -> StoreResult<bool> {
        let mut conn = self.client.clone();
        conn.set_nx::<_, _, bool>(key, value)
            .await
            .map_err(|e| map_store_error("SETNX", key, e))
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.client.clone();
        conn.exists::<_, bool>(key)
            .await
            .map_err(|e| map_store_error("EXISTS", key, e))
    }

    async fn del(&self, keys: &[String]) -> StoreResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.client.clone();
        let deleted = conn
            .del::<_, u64>(keys.to_vec())
            .await
            .map_err(|e| map_store_error("DEL", &keys.join(" "), e))?;

        debug!(requested = keys.len(), deleted, "DEL");
        Ok(deleted)
    }

    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        let mut conn = self.client.clone();
        conn.hget::<_, _, Option<String>>(key, field)
            .await
            .map_err(|e| map_store_error("HGET", key, e))
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.client.clone();
        conn.hset::<_, _, _, ()>(key, field, value)
            .await
            .map_err(|e| map_store_error("HSET", key, e))
    }

    async fn hset_nx(&self, key: &str, field: &str, value: &str) -> StoreResult<bool> {
        let mut conn = self.client.clone();
        conn.hset_nx::<_, _, _, bool>(key, field, value)
            .await
            .map_err(|e| map_store_error("HSETNX", key, e))
    }

    async fn hexists(&self, key: &str, field: &str) -> StoreResult<bool> {
        let mut conn = self.client.clone();
        conn.hexists::<_, _, bool>(key, field)
            .await
            .map_err(|e| map_store_error("HEXISTS", key, e))
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> StoreResult<()> {
        let mut conn = self.client.clone();
        conn.zadd::<_, _, _, ()>(key, member, score)
            .await
            .map_err(|e| map_store_error("ZADD", key, e))
    }

    async fn zrem(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut conn = self.client.clone();
        conn.zrem::<_, _, u64>(key, member)
            .await
            .map(|removed| removed > 0)
            .map_err(|e| map_store_error("ZREM", key, e))
    }

    async fn zrange(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        let mut conn = self.client.clone();
        conn.zrange::<_, Vec<String>>(key, start, stop)
            .await
            .map_err(|e| map_store_error("ZRANGE", key, e))
    }

    async fn zrevrange(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        let mut conn = self.client.clone();
        conn.zrevrange::<_, Vec<String>>(key, start, stop)
            .await
            .map_err(|e| map_store_error("ZREVRANGE", key, e))
    }

    async fn zscore(&self, key: &str, member: &str) -> StoreResult<Option<f64>> {
        let mut conn = self.client.clone();
        conn.zscore::<_, _, Option<f64>>(key, member)
            .await
            .map_err(|e| map_store_error("ZSCORE", key, e))
    }

    async fn zcard(&self, key: &str) -> StoreResult<u64> {
        let mut conn = self.client.clone();
        conn.zcard::<_, u64>(key)
            .await
            .map_err(|e| map_store_error("ZCARD", key, e))
    }

    async fn lpush(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.client.clone();
        conn.lpush::<_, _, ()>(key, value)
            .await
            .map_err(|e| map_store_error("LPUSH", key, e))
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        let mut conn = self.client.clone();
        conn.lrange::<_, Vec<String>>(key, start, stop)
            .await
            .map_err(|e| map_store_error("LRANGE", key, e))
    }

    async fn scan_match(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.client.clone();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| map_store_error("SCAN", pattern, e))?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may report a key more than once while the keyspace is rehashing.
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
