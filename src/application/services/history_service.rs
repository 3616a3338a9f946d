//! Per-day visit history of short links.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use crate::domain::entities::{RequestHistory, ShortLink};
use crate::domain::keys;
use crate::domain::repositories::KeyValueStore;
use crate::error::AppError;

/// Service writing and reading `history:<id>:<YYYYMMDD>` lists.
///
/// Each list holds one link's visits for one local calendar day, newest
/// first. History is telemetry: recording never fails the caller.
pub struct HistoryService<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> HistoryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Prepends a visit to today's bucket for `link`.
    ///
    /// The entry snapshots the link's current `url`. Encoding and store
    /// failures are logged and the visit is dropped.
    pub async fn record(&self, link: &ShortLink, ip: &str, user_agent: &str) {
        if !link.has_id() {
            warn!("Dropping visit for a link without id");
            return;
        }

        let entry = RequestHistory::new(link, ip, user_agent);
        let key = keys::history(&link.id, today());

        let payload = match serde_json::to_string(&entry) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to encode visit");
                return;
            }
        };

        match self.store.lpush(&key, &payload).await {
            Ok(()) => debug!(key = %key, ip, "Visit recorded"),
            Err(e) => warn!(key = %key, error = %e, "Failed to record visit"),
        }
    }

    /// Every visit to `link` recorded today, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Infrastructure`] if the bucket cannot be read.
    pub async fn list_all(&self, link: &ShortLink) -> Result<Vec<RequestHistory>, AppError> {
        self.list_for_day(link, today()).await
    }

    /// Every visit to `link` recorded on `day`, most recent first.
    ///
    /// An absent bucket yields an empty list. Elements that cannot be decoded
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Infrastructure`] if the bucket cannot be read.
    pub async fn list_for_day(
        &self,
        link: &ShortLink,
        day: NaiveDate,
    ) -> Result<Vec<RequestHistory>, AppError> {
        let key = keys::history(&link.id, day);
        let raw = self.store.lrange(&key, 0, -1).await?;

        Ok(raw
            .iter()
            .filter_map(|one| match serde_json::from_str(one) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping undecodable visit");
                    None
                }
            })
            .collect())
    }
}

/// Calendar day of the local clock, which selects the history bucket.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockKeyValueStore;
    use serde_json::json;

    fn test_link() -> ShortLink {
        let mut link = ShortLink::new("https://example.com", "", "alice");
        link.id = "abc123".to_string();
        link
    }

    #[tokio::test]
    async fn test_record_pushes_to_todays_bucket() {
        let expected_key = keys::history("abc123", today());

        let mut mock_store = MockKeyValueStore::new();
        mock_store
            .expect_lpush()
            .withf(move |key, value| {
                key == expected_key
                    && value.contains("\"ua\":\"curl/8.0\"")
                    && value.contains("https://example.com")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = HistoryService::new(Arc::new(mock_store));

        service.record(&test_link(), "10.0.0.1", "curl/8.0").await;
    }

    #[tokio::test]
    async fn test_record_swallows_store_errors() {
        let mut mock_store = MockKeyValueStore::new();
        mock_store
            .expect_lpush()
            .times(1)
            .returning(|_, _| Err(AppError::infrastructure("connection refused", json!({}))));

        let service = HistoryService::new(Arc::new(mock_store));

        service.record(&test_link(), "10.0.0.1", "curl/8.0").await;
    }

    #[tokio::test]
    async fn test_record_without_id_skips_store() {
        let mock_store = MockKeyValueStore::new();
        let service = HistoryService::new(Arc::new(mock_store));

        let link = ShortLink::new("https://example.com", "", "alice");
        service.record(&link, "10.0.0.1", "curl/8.0").await;
    }

    #[tokio::test]
    async fn test_list_skips_undecodable_entries() {
        let mut mock_store = MockKeyValueStore::new();
        mock_store.expect_lrange().times(1).returning(|_, _, _| {
            Ok(vec![
                r#"{"url":"https://example.com","ip":"1.1.1.1","ua":"curl","time":"2024-01-15T10:30:00Z"}"#
                    .to_string(),
                "garbage".to_string(),
            ])
        });

        let service = HistoryService::new(Arc::new(mock_store));

        let entries = service.list_all(&test_link()).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ip, "1.1.1.1");
    }

    #[tokio::test]
    async fn test_list_propagates_store_error() {
        let mut mock_store = MockKeyValueStore::new();
        mock_store
            .expect_lrange()
            .times(1)
            .returning(|_, _, _| Err(AppError::infrastructure("connection refused", json!({}))));

        let service = HistoryService::new(Arc::new(mock_store));

        let err = service.list_all(&test_link()).await.unwrap_err();
        assert!(matches!(err, AppError::Infrastructure { .. }));
    }
}
