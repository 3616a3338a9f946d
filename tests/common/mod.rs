#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use link_store::application::services::{HistoryService, LinkService, UserService};
use link_store::domain::entities::ShortLink;
use link_store::domain::keys;
use link_store::domain::repositories::KeyValueStore;
use link_store::infrastructure::kv::MemoryStore;

pub fn create_test_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub fn user_service(store: &Arc<MemoryStore>) -> UserService<MemoryStore> {
    UserService::new(store.clone())
}

pub fn link_service(store: &Arc<MemoryStore>) -> LinkService<MemoryStore> {
    LinkService::new(store.clone())
}

pub fn history_service(store: &Arc<MemoryStore>) -> HistoryService<MemoryStore> {
    HistoryService::new(store.clone())
}

/// Builds an unsaved link with a fixed id.
pub fn link_with_id(id: &str, url: &str, owner: &str) -> ShortLink {
    let mut link = ShortLink::new(url, "", owner);
    link.id = id.to_string();
    link
}

/// Writes a link record and its index entries directly, scored at `score`.
pub async fn seed_link(store: &MemoryStore, id: &str, owner: &str, score: i64) -> ShortLink {
    let time = DateTime::<Utc>::from_timestamp(score, 0).unwrap();
    let mut link = link_with_id(id, &format!("https://example.com/{id}"), owner);
    link.created_at = Some(time);
    link.updated_at = Some(time);

    store
        .set(&keys::link(id), &serde_json::to_string(&link).unwrap())
        .await
        .unwrap();
    store
        .zadd(&keys::owner_links(owner), id, score as f64)
        .await
        .unwrap();
    store
        .zadd(keys::GLOBAL_LINK_INDEX, id, score as f64)
        .await
        .unwrap();

    link
}

pub async fn history_keys(store: &MemoryStore, id: &str) -> Vec<String> {
    store.scan_match(&keys::history_pattern(id)).await.unwrap()
}
