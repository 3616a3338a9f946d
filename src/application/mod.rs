//! Application layer services implementing the storage rules.
//!
//! Services own the key layout and the multi-key write sequences. Each one is
//! generic over [`crate::domain::repositories::KeyValueStore`] and receives
//! the shared store as `Arc<S>` at construction.
//!
//! # Available Services
//!
//! - [`services::user_service::UserService`] - User signup and password verification
//! - [`services::link_service::LinkService`] - Link id allocation, storage, indexing and deletion
//! - [`services::history_service::HistoryService`] - Per-day visit history

pub mod services;
