//! Short link allocation, storage, indexing and cascading deletion.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::entities::{LinkPatch, ShortLink};
use crate::domain::keys;
use crate::domain::repositories::KeyValueStore;
use crate::error::{AppError, LINK_NOT_FOUND};
use crate::utils::code_generator::generate_id;

/// Outcome of a [`LinkService::reconcile`] sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Index members removed because their link record no longer exists.
    pub dangling_removed: u64,
    /// Tombstoned links whose history buckets were purged.
    pub orphans_purged: u64,
}

/// Service owning `link:<id>` records and the `links` / `links:<owner>` indices.
///
/// A link lives under three keys plus one history list per day. The store
/// only makes single commands atomic, so every multi-key operation here is a
/// sequence of independent writes:
///
/// - [`save`](Self::save) writes the record, then the owner index, then the
///   global index. A failure part way is returned and not rolled back.
/// - [`delete`](Self::delete) removes index entries first, then the record,
///   then the history buckets, logging and skipping failed steps.
///
/// Leftovers from interrupted sequences are filtered out by
/// [`list`](Self::list) and removed by [`reconcile`](Self::reconcile).
pub struct LinkService<S: KeyValueStore> {
    store: Arc<S>,
    /// Maximum id draws per allocation, `0` for unbounded.
    max_id_attempts: u32,
}

impl<S: KeyValueStore> LinkService<S> {
    /// Creates a link service with unbounded id allocation.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            max_id_attempts: 0,
        }
    }

    /// Caps the number of id draws per allocation. `0` removes the cap.
    pub fn with_max_id_attempts(mut self, max_id_attempts: u32) -> Self {
        self.max_id_attempts = max_id_attempts;
        self
    }

    /// Assigns a random id that has no record in the store yet.
    ///
    /// Draws until an unused id comes up. Ids still awaiting a history purge
    /// in `orphans:history` count as used. The id is not reserved: another
    /// caller can draw the same id before this link is saved. Use
    /// [`create`](Self::create) when that matters.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if the link already has an id
    /// - [`AppError::Infrastructure`] if the store cannot be read, or the
    ///   attempt cap is reached
    pub async fn generate_id(&self, link: &mut ShortLink) -> Result<(), AppError> {
        if link.has_id() {
            return Err(id_already_assigned(&link.id));
        }

        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            let id = generate_id();

            if !self.store.exists(&keys::link(&id)).await?
                && !self.is_tombstoned(&id).await?
            {
                debug!(id = %id, attempts, "Allocated short link id");
                link.id = id;
                return Ok(());
            }

            debug!(id = %id, "Short link id collision, drawing again");
            self.check_attempts(attempts)?;
        }
    }

    /// Writes the link record and adds its id to the owner and global indices.
    ///
    /// Refreshes `updated_at` (and `created_at` on first save). Both indices
    /// are scored with the save time, so re-saving moves the link to the end.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] naming the first empty field among `id`,
    ///   `url` and `created_by`; nothing is written
    /// - [`AppError::Infrastructure`] if any of the three writes fails
    pub async fn save(&self, link: &mut ShortLink) -> Result<(), AppError> {
        require("id", &link.id)?;
        require_content(link)?;

        let now = Utc::now();
        link.updated_at = Some(now);
        if link.created_at.is_none() {
            link.created_at = Some(now);
        }

        let payload = encode(link)?;
        self.store.set(&keys::link(&link.id), &payload).await?;
        self.index(link, now).await?;

        debug!(id = %link.id, owner = %link.created_by, "Short link saved");
        Ok(())
    }

    /// Allocates an id and stores a new link in one race-free step.
    ///
    /// Each drawn id is claimed with `SET NX` on the record key; a lost claim
    /// draws again. The link is indexed after the claim succeeds.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if the link already has an id, or `url` or
    ///   `created_by` is empty
    /// - [`AppError::Infrastructure`] on store failure or when the attempt
    ///   cap is reached
    pub async fn create(&self, mut link: ShortLink) -> Result<ShortLink, AppError> {
        if link.has_id() {
            return Err(id_already_assigned(&link.id));
        }
        require_content(&link)?;

        let now = Utc::now();
        link.created_at = Some(now);
        link.updated_at = Some(now);

        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            link.id = generate_id();

            if self.is_tombstoned(&link.id).await? {
                debug!(id = %link.id, "Short link id awaits history purge, drawing again");
                self.check_attempts(attempts)?;
                continue;
            }

            let payload = encode(&link)?;
            if self.store.set_nx(&keys::link(&link.id), &payload).await? {
                break;
            }

            debug!(id = %link.id, "Short link id already claimed, drawing again");
            self.check_attempts(attempts)?;
        }

        self.index(&link, now).await?;

        info!(id = %link.id, owner = %link.created_by, attempts, "Short link created");
        Ok(link)
    }

    /// Loads a link by id.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] with a generic message if the id is empty,
    ///   the record is missing, or it cannot be decoded
    /// - [`AppError::Infrastructure`] if the store cannot be read
    pub async fn load(&self, id: &str) -> Result<ShortLink, AppError> {
        if id.is_empty() {
            return Err(AppError::not_found(LINK_NOT_FOUND, json!({})));
        }

        self.fetch(id)
            .await?
            .ok_or_else(|| AppError::not_found(LINK_NOT_FOUND, json!({ "id": id })))
    }

    /// Replaces the mutable fields of `link` with `patch` and saves it.
    ///
    /// # Errors
    ///
    /// Same as [`save`](Self::save).
    pub async fn update(&self, link: &mut ShortLink, patch: LinkPatch) -> Result<(), AppError> {
        link.apply(patch);
        self.save(link).await
    }

    /// Removes a link, its index entries and every history bucket.
    ///
    /// Best effort: each step is attempted even if an earlier one failed, and
    /// failures are only logged. If the history buckets cannot be purged the
    /// id is tombstoned for [`reconcile`](Self::reconcile).
    pub async fn delete(&self, link: &ShortLink) {
        if !link.has_id() {
            warn!("Ignoring delete of a link without id");
            return;
        }

        let owner_index = keys::owner_links(&link.created_by);
        for index in [owner_index.as_str(), keys::GLOBAL_LINK_INDEX] {
            if let Err(e) = self.store.zrem(index, &link.id).await {
                warn!(id = %link.id, index, error = %e, "Failed to remove link from index");
            }
        }

        if let Err(e) = self.store.del(&[keys::link(&link.id)]).await {
            warn!(id = %link.id, error = %e, "Failed to delete link record");
        }

        match self.purge_history(&link.id).await {
            Ok(purged) => debug!(id = %link.id, purged, "History buckets removed"),
            Err(e) => {
                warn!(id = %link.id, error = %e, "Failed to purge history, tombstoning");
                let score = Utc::now().timestamp() as f64;
                if let Err(e) = self
                    .store
                    .zadd(keys::HISTORY_TOMBSTONES, &link.id, score)
                    .await
                {
                    warn!(id = %link.id, error = %e, "Failed to tombstone history purge");
                }
            }
        }

        info!(id = %link.id, owner = %link.created_by, "Short link deleted");
    }

    /// Returns one page of links, newest first.
    ///
    /// Lists `owner`'s links, or every link when `owner` is `None`. Index
    /// entries whose record is gone are skipped, so a page can be short.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if `page` or `page_size` is zero
    /// - [`AppError::Infrastructure`] on store failure
    pub async fn list(
        &self,
        owner: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<ShortLink>, AppError> {
        if page == 0 || page_size == 0 {
            return Err(AppError::bad_request(
                "page and page_size must be at least 1",
                json!({ "page": page, "page_size": page_size }),
            ));
        }

        let start = (page - 1).saturating_mul(page_size);
        let stop = start.saturating_add(page_size - 1);
        let index = keys::link_index(owner);

        let ids = self
            .store
            .zrevrange(&index, to_rank(start), to_rank(stop))
            .await?;

        let mut links = Vec::with_capacity(ids.len());
        for id in ids {
            match self.fetch(&id).await? {
                Some(link) => links.push(link),
                None => debug!(id = %id, index = %index, "Skipping dangling index entry"),
            }
        }

        Ok(links)
    }

    /// Number of entries in `owner`'s index, or in the global index.
    pub async fn count(&self, owner: Option<&str>) -> Result<u64, AppError> {
        self.store.zcard(&keys::link_index(owner)).await
    }

    /// Sweeps leftovers of interrupted saves and deletes.
    ///
    /// Removes index members whose record is missing from the global index
    /// and every owner index, then retries the history purge for tombstoned
    /// ids. A tombstoned id whose record exists again is only untombstoned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Infrastructure`] if an index cannot be read or
    /// written. Per-id purge failures are logged and left tombstoned.
    pub async fn reconcile(&self) -> Result<ReconcileReport, AppError> {
        let mut report = ReconcileReport::default();

        let mut indices = vec![keys::GLOBAL_LINK_INDEX.to_string()];
        indices.extend(
            self.store
                .scan_match(&format!("{}*", keys::OWNER_LINK_INDEX_PREFIX))
                .await?,
        );

        for index in &indices {
            for id in self.store.zrange(index, 0, -1).await? {
                if !self.store.exists(&keys::link(&id)).await?
                    && self.store.zrem(index, &id).await?
                {
                    debug!(id = %id, index = %index, "Removed dangling index entry");
                    report.dangling_removed += 1;
                }
            }
        }

        for id in self.store.zrange(keys::HISTORY_TOMBSTONES, 0, -1).await? {
            if self.store.exists(&keys::link(&id)).await? {
                self.store.zrem(keys::HISTORY_TOMBSTONES, &id).await?;
                continue;
            }

            match self.purge_history(&id).await {
                Ok(_) => {
                    self.store.zrem(keys::HISTORY_TOMBSTONES, &id).await?;
                    report.orphans_purged += 1;
                }
                Err(e) => warn!(id = %id, error = %e, "History purge still failing"),
            }
        }

        info!(
            indices = indices.len(),
            dangling_removed = report.dangling_removed,
            orphans_purged = report.orphans_purged,
            "Reconcile finished"
        );
        Ok(report)
    }

    /// Reads and decodes a record. Missing and undecodable records are `None`.
    async fn fetch(&self, id: &str) -> Result<Option<ShortLink>, AppError> {
        let key = keys::link(id);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(link) => Ok(Some(link)),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to decode short link");
                Ok(None)
            }
        }
    }

    async fn index(&self, link: &ShortLink, at: DateTime<Utc>) -> Result<(), AppError> {
        let score = at.timestamp() as f64;
        self.store
            .zadd(&keys::owner_links(&link.created_by), &link.id, score)
            .await?;
        self.store
            .zadd(keys::GLOBAL_LINK_INDEX, &link.id, score)
            .await
    }

    async fn is_tombstoned(&self, id: &str) -> Result<bool, AppError> {
        Ok(self
            .store
            .zscore(keys::HISTORY_TOMBSTONES, id)
            .await?
            .is_some())
    }

    async fn purge_history(&self, id: &str) -> Result<u64, AppError> {
        let buckets = self.store.scan_match(&keys::history_pattern(id)).await?;
        self.store.del(&buckets).await
    }

    fn check_attempts(&self, attempts: u32) -> Result<(), AppError> {
        if self.max_id_attempts != 0 && attempts >= self.max_id_attempts {
            warn!(attempts, "Giving up on short link id allocation");
            return Err(AppError::infrastructure(
                "Failed to allocate a unique short link id",
                json!({ "attempts": attempts }),
            ));
        }
        Ok(())
    }
}

fn require(field: &'static str, value: &str) -> Result<(), AppError> {
    if value.is_empty() {
        return Err(AppError::bad_request(
            format!("{field} is required"),
            json!({ "field": field }),
        ));
    }
    Ok(())
}

fn require_content(link: &ShortLink) -> Result<(), AppError> {
    require("url", &link.url)?;
    require("created_by", &link.created_by)
}

fn id_already_assigned(id: &str) -> AppError {
    AppError::bad_request("id is already assigned", json!({ "id": id }))
}

fn encode(link: &ShortLink) -> Result<String, AppError> {
    serde_json::to_string(link).map_err(|e| {
        AppError::infrastructure(
            "Failed to encode short link",
            json!({ "id": link.id, "reason": e.to_string() }),
        )
    })
}

fn to_rank(n: u64) -> isize {
    isize::try_from(n).unwrap_or(isize::MAX)
}
