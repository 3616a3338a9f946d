//! Domain layer containing the stored data model and the storage contract.
//!
//! # Architecture
//!
//! - [`entities`] - Users, short links and visit history records
//! - [`keys`] - Key layout shared with every other reader of the store
//! - [`repositories`] - The [`repositories::KeyValueStore`] trait
//!
//! The domain layer has no dependency on Redis or on the services that
//! orchestrate it; stores are supplied from `crate::infrastructure`.

pub mod entities;
pub mod keys;
pub mod repositories;
