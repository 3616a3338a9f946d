//! Utility functions shared by the services.
//!
//! - [`code_generator`] - Random short link id generation
//! - [`password`] - Salt generation, Argon2id digests and their serde encoding

pub mod code_generator;
pub mod password;
