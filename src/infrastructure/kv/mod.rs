//! Key-value store implementations.
//!
//! Provides two implementations of [`crate::domain::repositories::KeyValueStore`]:
//! - [`RedisStore`] - Production store over a Redis `ConnectionManager`
//! - [`MemoryStore`] - In-process store for tests and local runs

mod memory_store;
mod redis_store;

pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;
