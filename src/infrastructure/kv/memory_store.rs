//! In-process key-value store with Redis command semantics.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::repositories::{KeyValueStore, StoreResult};
use crate::error::AppError;

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    ZSet(HashMap<String, f64>),
    List(VecDeque<String>),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Hash(_) => "hash",
            Value::ZSet(_) => "zset",
            Value::List(_) => "list",
        }
    }
}

/// A store that keeps everything in a `HashMap` behind a `RwLock`.
///
/// Mirrors Redis closely enough for the services: commands against a key of
/// the wrong type fail with `WRONGTYPE`, emptied collections disappear, and
/// sorted sets order by score then member.
///
/// Used by the integration tests and by the admin CLI's `--memory` mode.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        debug!("Using MemoryStore");
        Self::default()
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

fn wrong_type(op: &'static str, key: &str, found: &Value) -> AppError {
    AppError::infrastructure(
        "WRONGTYPE Operation against a key holding the wrong kind of value",
        json!({ "op": op, "key": key, "found": found.type_name() }),
    )
}

/// Resolves Redis-style inclusive rank bounds against a collection length.
fn rank_bounds(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if len == 0 || start > stop || start >= len {
        None
    } else {
        Some((start as usize, stop as usize))
    }
}

fn sorted_members(set: &HashMap<String, f64>) -> Vec<String> {
    let mut members: Vec<(&String, &f64)> = set.iter().collect();
    members.sort_by(|a, b| {
        a.1.partial_cmp(b.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    members.into_iter().map(|(m, _)| m.clone()).collect()
}

fn slice(items: Vec<String>, start: isize, stop: isize) -> Vec<String> {
    match rank_bounds(items.len(), start, stop) {
        Some((from, to)) => items[from..=to].to_vec(),
        None => Vec::new(),
    }
}

/// Glob matching with the subset of Redis syntax the services use: `*`, `?`
/// and `\` escapes.
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    match (pattern.first(), text.first()) {
        (None, None) => true,
        (Some(b'*'), _) => {
            glob_match(&pattern[1..], text) || (!text.is_empty() && glob_match(pattern, &text[1..]))
        }
        (Some(b'?'), Some(_)) => glob_match(&pattern[1..], &text[1..]),
        (Some(b'\\'), Some(t)) if pattern.len() > 1 => {
            pattern[1] == *t && glob_match(&pattern[2..], &text[1..])
        }
        (Some(p), Some(t)) => p == t && glob_match(&pattern[1..], &text[1..]),
        _ => false,
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self.data.read().await.get(key) {
            None => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s.clone())),
            Some(other) => Err(wrong_type("GET", key, other)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.data
            .write()
            .await
            .insert(key.to_string(), Value::Str(value.to_string()));
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        if data.contains_key(key) {
            return Ok(false);
        }
        data.insert(key.to_string(), Value::Str(value.to_string()));
        Ok(true)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.data.read().await.contains_key(key))
    }

    async fn del(&self, keys: &[String]) -> StoreResult<u64> {
        let mut data = self.data.write().await;
        Ok(keys.iter().filter(|k| data.remove(*k).is_some()).count() as u64)
    }

    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        match self.data.read().await.get(key) {
            None => Ok(None),
            Some(Value::Hash(h)) => Ok(h.get(field).cloned()),
            Some(other) => Err(wrong_type("HGET", key, other)),
        }
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        let mut data = self.data.write().await;
        match data
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(HashMap::new()))
        {
            Value::Hash(h) => {
                h.insert(field.to_string(), value.to_string());
                Ok(())
            }
            other => Err(wrong_type("HSET", key, other)),
        }
    }

    async fn hset_nx(&self, key: &str, field: &str, value: &str) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        match data
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(HashMap::new()))
        {
            Value::Hash(h) => {
                if h.contains_key(field) {
                    return Ok(false);
                }
                h.insert(field.to_string(), value.to_string());
                Ok(true)
            }
            other => Err(wrong_type("HSETNX", key, other)),
        }
    }

    async fn hexists(&self, key: &str, field: &str) -> StoreResult<bool> {
        match self.data.read().await.get(key) {
            None => Ok(false),
            Some(Value::Hash(h)) => Ok(h.contains_key(field)),
            Some(other) => Err(wrong_type("HEXISTS", key, other)),
        }
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> StoreResult<()> {
        let mut data = self.data.write().await;
        match data
            .entry(key.to_string())
            .or_insert_with(|| Value::ZSet(HashMap::new()))
        {
            Value::ZSet(z) => {
                z.insert(member.to_string(), score);
                Ok(())
            }
            other => Err(wrong_type("ZADD", key, other)),
        }
    }

    async fn zrem(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        let (removed, now_empty) = match data.get_mut(key) {
            None => return Ok(false),
            Some(Value::ZSet(z)) => (z.remove(member).is_some(), z.is_empty()),
            Some(other) => return Err(wrong_type("ZREM", key, other)),
        };
        if now_empty {
            data.remove(key);
        }
        Ok(removed)
    }

    async fn zrange(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        match self.data.read().await.get(key) {
            None => Ok(Vec::new()),
            Some(Value::ZSet(z)) => Ok(slice(sorted_members(z), start, stop)),
            Some(other) => Err(wrong_type("ZRANGE", key, other)),
        }
    }

    async fn zrevrange(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        match self.data.read().await.get(key) {
            None => Ok(Vec::new()),
            Some(Value::ZSet(z)) => {
                let mut members = sorted_members(z);
                members.reverse();
                Ok(slice(members, start, stop))
            }
            Some(other) => Err(wrong_type("ZREVRANGE", key, other)),
        }
    }

    async fn zscore(&self, key: &str, member: &str) -> StoreResult<Option<f64>> {
        match self.data.read().await.get(key) {
            None => Ok(None),
            Some(Value::ZSet(z)) => Ok(z.get(member).copied()),
            Some(other) => Err(wrong_type("ZSCORE", key, other)),
        }
    }

    async fn zcard(&self, key: &str) -> StoreResult<u64> {
        match self.data.read().await.get(key) {
            None => Ok(0),
            Some(Value::ZSet(z)) => Ok(z.len() as u64),
            Some(other) => Err(wrong_type("ZCARD", key, other)),
        }
    }

    async fn lpush(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut data = self.data.write().await;
        match data
            .entry(key.to_string())
            .or_insert_with(|| Value::List(VecDeque::new()))
        {
            Value::List(l) => {
                l.push_front(value.to_string());
                Ok(())
            }
            other => Err(wrong_type("LPUSH", key, other)),
        }
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        match self.data.read().await.get(key) {
            None => Ok(Vec::new()),
            Some(Value::List(l)) => Ok(slice(l.iter().cloned().collect(), start, stop)),
            Some(other) => Err(wrong_type("LRANGE", key, other)),
        }
    }

    async fn scan_match(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .data
            .read()
            .await
            .keys()
            .filter(|k| glob_match(pattern.as_bytes(), k.as_bytes()))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn health_check(&self) -> bool {
        true
    }
}
