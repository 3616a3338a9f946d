//! Storage trait definitions for the domain layer.
//!
//! The services in [`crate::application::services`] talk to storage only
//! through [`KeyValueStore`]. Concrete stores live in
//! `crate::infrastructure::kv` and are injected as `Arc<S>` at construction.
//!
//! # Testing
//!
//! - `MockKeyValueStore` is generated with `mockall` under `cfg(test)` for
//!   asserting exactly which commands a service issues
//! - Integration tests in `tests/*.rs` run the services on
//!   [`crate::infrastructure::kv::MemoryStore`]

pub mod kv_store;

pub use kv_store::{KeyValueStore, StoreResult};

#[cfg(test)]
pub use kv_store::MockKeyValueStore;
