mod common;

use std::collections::HashSet;
use std::time::Duration;

use chrono::NaiveDate;
use link_store::domain::entities::{LinkPatch, ShortLink};
use link_store::domain::keys;
use link_store::domain::repositories::KeyValueStore;
use link_store::error::{AppError, LINK_NOT_FOUND};

// ─── ID ALLOCATION ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_generated_ids_are_unique() {
    let store = common::create_test_store();
    let links = common::link_service(&store);

    let mut ids = HashSet::new();
    for n in 0..200 {
        let mut link = ShortLink::new(format!("https://example.com/{n}"), "", "alice");
        links.generate_id(&mut link).await.unwrap();

        assert_eq!(link.id.len(), 6);
        assert!(link.id.chars().all(|c| c.is_ascii_alphanumeric()));

        links.save(&mut link).await.unwrap();
        assert!(ids.insert(link.id.clone()), "duplicate id {}", link.id);
    }

    assert_eq!(links.count(None).await.unwrap(), 200);
    assert_eq!(links.count(Some("alice")).await.unwrap(), 200);
}

#[tokio::test]
async fn test_generate_id_refuses_identified_link() {
    let store = common::create_test_store();
    let links = common::link_service(&store);

    let mut link = common::link_with_id("abc123", "https://example.com", "alice");
    let err = links.generate_id(&mut link).await.unwrap_err();

    assert!(matches!(err, AppError::Validation { .. }));
    assert_eq!(link.id, "abc123");
}

#[tokio::test]
async fn test_create_claims_and_indexes() {
    let store = common::create_test_store();
    let links = common::link_service(&store);

    let mut ids = HashSet::new();
    for n in 0..50 {
        let link = links
            .create(ShortLink::new(format!("https://example.com/{n}"), "", "alice"))
            .await
            .unwrap();

        assert!(link.created_at.is_some());
        assert_eq!(links.load(&link.id).await.unwrap(), link);
        ids.insert(link.id);
    }

    assert_eq!(ids.len(), 50);
    assert_eq!(links.count(Some("alice")).await.unwrap(), 50);
    assert_eq!(links.count(None).await.unwrap(), 50);
}

// ─── SAVE / LOAD ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_save_then_load() {
    let store = common::create_test_store();
    let links = common::link_service(&store);

    let mut link = common::link_with_id("abc123", "https://example.com", "alice");
    link.description = "docs".to_string();
    links.save(&mut link).await.unwrap();

    let loaded = links.load("abc123").await.unwrap();

    assert_eq!(loaded, link);
    assert!(loaded.is_enabled);
    assert_eq!(loaded.created_at, loaded.updated_at);

    assert_eq!(
        store.zrange(keys::GLOBAL_LINK_INDEX, 0, 0).await.unwrap(),
        vec!["abc123".to_string()]
    );
    assert_eq!(
        store.zrange("links:alice", 0, 0).await.unwrap(),
        vec!["abc123".to_string()]
    );
}

#[tokio::test]
async fn test_save_missing_fields_writes_nothing() {
    let store = common::create_test_store();
    let links = common::link_service(&store);

    let mut no_id = ShortLink::new("https://example.com", "", "alice");
    let mut no_url = common::link_with_id("abc123", "", "alice");
    let mut no_owner = common::link_with_id("abc123", "https://example.com", "");

    for link in [&mut no_id, &mut no_url, &mut no_owner] {
        let err = links.save(link).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_load_missing_link() {
    let store = common::create_test_store();
    let links = common::link_service(&store);

    for id in ["", "nope00"] {
        let err = links.load(id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
        assert_eq!(err.to_string(), LINK_NOT_FOUND);
    }
}

#[tokio::test]
async fn test_load_accepts_legacy_enable_field() {
    let store = common::create_test_store();
    store
        .set(
            "link:old001",
            r#"{"id":"old001","url":"https://example.com","is_enable":true,"created_by":"alice"}"#,
        )
        .await
        .unwrap();
    let links = common::link_service(&store);

    let link = links.load("old001").await.unwrap();

    assert!(link.is_enabled);
    assert_eq!(link.description, "");
    assert!(link.created_at.is_none());
}

// ─── UPDATE ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_keeps_identity_and_bumps_time() {
    let store = common::create_test_store();
    let links = common::link_service(&store);

    let mut link = common::link_with_id("abc123", "https://example.com", "alice");
    links.save(&mut link).await.unwrap();
    let created_at = link.created_at;
    let first_update = link.updated_at;

    tokio::time::sleep(Duration::from_millis(5)).await;

    links
        .update(
            &mut link,
            LinkPatch {
                url: "https://example.org".to_string(),
                description: "moved".to_string(),
                is_enabled: false,
            },
        )
        .await
        .unwrap();

    let loaded = links.load("abc123").await.unwrap();

    assert_eq!(loaded.id, "abc123");
    assert_eq!(loaded.created_by, "alice");
    assert_eq!(loaded.url, "https://example.org");
    assert_eq!(loaded.description, "moved");
    assert!(!loaded.is_enabled);
    assert_eq!(loaded.created_at, created_at);
    assert!(loaded.updated_at > first_update);

    assert_eq!(links.count(Some("alice")).await.unwrap(), 1);
    assert_eq!(links.count(None).await.unwrap(), 1);
}

// ─── DELETE ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_removes_everything() {
    let store = common::create_test_store();
    let links = common::link_service(&store);
    let history = common::history_service(&store);

    let mut link = common::link_with_id("abc123", "https://example.com", "alice");
    links.save(&mut link).await.unwrap();
    let other = common::seed_link(&store, "xyz789", "alice", 1_700_000_000).await;

    history.record(&link, "10.0.0.1", "curl/8.0").await;
    history.record(&other, "10.0.0.2", "curl/8.0").await;
    let old_day = keys::history("abc123", NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    store.lpush(&old_day, "{}").await.unwrap();
    assert_eq!(common::history_keys(&store, "abc123").await.len(), 2);

    links.delete(&link).await;

    assert!(store.get("link:abc123").await.unwrap().is_none());
    assert!(
        !store
            .zrange(keys::GLOBAL_LINK_INDEX, 0, -1)
            .await
            .unwrap()
            .contains(&"abc123".to_string())
    );
    assert_eq!(
        store.zrange("links:alice", 0, -1).await.unwrap(),
        vec!["xyz789".to_string()]
    );
    assert!(common::history_keys(&store, "abc123").await.is_empty());
    assert!(
        store
            .zrange(keys::HISTORY_TOMBSTONES, 0, -1)
            .await
            .unwrap()
            .is_empty()
    );

    assert_eq!(common::history_keys(&store, "xyz789").await.len(), 1);
    assert_eq!(links.load("xyz789").await.unwrap(), other);
}

#[tokio::test]
async fn test_delete_glob_id_spares_other_histories() {
    let store = common::create_test_store();
    let links = common::link_service(&store);
    let history = common::history_service(&store);

    let neighbour = common::seed_link(&store, "abc123", "bob", 1_700_000_000).await;
    history.record(&neighbour, "10.0.0.1", "curl/8.0").await;

    for id in ["ab*", "abc12?", "[a]bc123", "abc123:x"] {
        let mut link = common::link_with_id(id, "https://example.com", "alice");
        links.save(&mut link).await.unwrap();
        history.record(&link, "10.0.0.2", "curl/8.0").await;

        links.delete(&link).await;

        assert!(common::history_keys(&store, id).await.is_empty());
        assert_eq!(
            common::history_keys(&store, "abc123").await.len(),
            1,
            "deleting {id} touched abc123's history"
        );
    }
}

#[tokio::test]
async fn test_delete_twice_is_harmless() {
    let store = common::create_test_store();
    let links = common::link_service(&store);

    let link = common::seed_link(&store, "abc123", "alice", 1_700_000_000).await;

    links.delete(&link).await;
    links.delete(&link).await;

    assert!(store.is_empty().await);
}

// ─── LIST ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_newest_first_with_pages() {
    let store = common::create_test_store();
    let links = common::link_service(&store);

    for (n, id) in ["aaaaa1", "aaaaa2", "aaaaa3", "aaaaa4", "aaaaa5"]
        .iter()
        .enumerate()
    {
        let owner = if n % 2 == 0 { "alice" } else { "bob" };
        common::seed_link(&store, id, owner, 1_700_000_000 + n as i64).await;
    }

    let ids = |page: Vec<ShortLink>| page.into_iter().map(|l| l.id).collect::<Vec<_>>();

    assert_eq!(
        ids(links.list(None, 1, 2).await.unwrap()),
        vec!["aaaaa5", "aaaaa4"]
    );
    assert_eq!(
        ids(links.list(None, 3, 2).await.unwrap()),
        vec!["aaaaa1"]
    );
    assert!(links.list(None, 4, 2).await.unwrap().is_empty());

    assert_eq!(
        ids(links.list(Some("alice"), 1, 10).await.unwrap()),
        vec!["aaaaa5", "aaaaa3", "aaaaa1"]
    );
    assert!(links.list(Some("carol"), 1, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_rejects_zero_page() {
    let store = common::create_test_store();
    let links = common::link_service(&store);

    assert!(matches!(
        links.list(None, 0, 10).await.unwrap_err(),
        AppError::Validation { .. }
    ));
    assert!(matches!(
        links.list(None, 1, 0).await.unwrap_err(),
        AppError::Validation { .. }
    ));
}

#[tokio::test]
async fn test_list_skips_dangling_entries() {
    let store = common::create_test_store();
    let links = common::link_service(&store);

    common::seed_link(&store, "keep01", "alice", 1_700_000_000).await;
    common::seed_link(&store, "gone01", "alice", 1_700_000_001).await;
    store.del(&["link:gone01".to_string()]).await.unwrap();

    let page = links.list(Some("alice"), 1, 10).await.unwrap();

    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, "keep01");
    assert_eq!(links.count(Some("alice")).await.unwrap(), 2);
}

// ─── RECONCILE ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reconcile_removes_dangling_entries() {
    let store = common::create_test_store();
    let links = common::link_service(&store);

    common::seed_link(&store, "keep01", "alice", 1_700_000_000).await;
    common::seed_link(&store, "gone01", "alice", 1_700_000_001).await;
    common::seed_link(&store, "gone02", "bob", 1_700_000_002).await;
    store
        .del(&["link:gone01".to_string(), "link:gone02".to_string()])
        .await
        .unwrap();

    let report = links.reconcile().await.unwrap();

    // each dangling id sits in the global index and its owner's index
    assert_eq!(report.dangling_removed, 4);
    assert_eq!(report.orphans_purged, 0);
    assert_eq!(links.count(None).await.unwrap(), 1);
    assert_eq!(links.count(Some("alice")).await.unwrap(), 1);
    assert_eq!(links.count(Some("bob")).await.unwrap(), 0);

    let again = links.reconcile().await.unwrap();
    assert_eq!(again.dangling_removed, 0);
}

#[tokio::test]
async fn test_reconcile_purges_tombstoned_history() {
    let store = common::create_test_store();
    let links = common::link_service(&store);

    let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    store
        .lpush(&keys::history("gone01", today), "{}")
        .await
        .unwrap();
    store
        .zadd(keys::HISTORY_TOMBSTONES, "gone01", 1_700_000_000.0)
        .await
        .unwrap();

    let live = common::seed_link(&store, "live01", "alice", 1_700_000_000).await;
    store
        .lpush(&keys::history(&live.id, today), "{}")
        .await
        .unwrap();
    store
        .zadd(keys::HISTORY_TOMBSTONES, "live01", 1_700_000_000.0)
        .await
        .unwrap();

    let report = links.reconcile().await.unwrap();

    assert_eq!(report.orphans_purged, 1);
    assert!(common::history_keys(&store, "gone01").await.is_empty());
    assert_eq!(common::history_keys(&store, "live01").await.len(), 1);
    assert_eq!(store.zcard(keys::HISTORY_TOMBSTONES).await.unwrap(), 0);
}
