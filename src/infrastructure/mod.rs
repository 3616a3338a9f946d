//! Infrastructure layer for external integrations.
//!
//! This layer implements the storage contract defined by the domain layer.
//!
//! # Modules
//!
//! - [`kv`] - Key-value stores (Redis and in-memory)

pub mod kv;
