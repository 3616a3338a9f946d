//! # Link Store
//!
//! Persistence core of a URL shortener, backed by Redis: user credentials,
//! short link records with random ids, and per-day visit history.
//!
//! ## Architecture
//!
//! - **Domain Layer** ([`domain`]) - Entities, key layout and the [`KeyValueStore`] contract
//! - **Application Layer** ([`application`]) - Services implementing the storage rules
//! - **Infrastructure Layer** ([`infrastructure`]) - Redis and in-memory stores
//!
//! ## Storage Layout
//!
//! | Key | Type | Contents |
//! |---|---|---|
//! | `users` | hash | username → JSON user |
//! | `link:<id>` | string | JSON short link |
//! | `links:<username>` | sorted set | link ids by save time |
//! | `links` | sorted set | link ids by save time |
//! | `history:<id>:<YYYYMMDD>` | list | JSON visits, newest first |
//!
//! The store only guarantees single-key atomicity. See
//! [`application::services::LinkService`] for how multi-key updates are
//! sequenced and repaired.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use link_store::prelude::*;
//!
//! # async fn run() -> Result<(), AppError> {
//! let store = Arc::new(RedisStore::connect("redis://localhost:6379").await?);
//! let links = LinkService::new(store.clone());
//!
//! let link = links
//!     .create(ShortLink::new("https://example.com", "docs", "alice"))
//!     .await?;
//! println!("short id: {}", link.id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! The admin binary loads configuration from environment variables via
//! [`config::Config`].

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod telemetry;
pub mod utils;

pub use domain::repositories::KeyValueStore;
pub use error::AppError;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{
        HistoryService, LinkService, ReconcileReport, UserService,
    };
    pub use crate::domain::entities::{
        LinkPatch, NewUser, RequestHistory, Role, ShortLink, User,
    };
    pub use crate::domain::repositories::KeyValueStore;
    pub use crate::error::AppError;
    pub use crate::infrastructure::kv::{MemoryStore, RedisStore};
}
