//! Core domain entities representing the stored data model.
//!
//! Entities are plain serde structs whose JSON shape is the on-disk format in
//! the key-value store. They carry no storage logic.
//!
//! # Entity Types
//!
//! - [`User`] - An operator account with password material
//! - [`ShortLink`] - A redirect mapping owned by a user
//! - [`RequestHistory`] - One visit to a short link
//!
//! Creation and mutation inputs are separate structs: [`NewUser`] and [`LinkPatch`].

pub mod history;
pub mod link;
pub mod user;

pub use history::RequestHistory;
pub use link::{LinkPatch, ShortLink};
pub use user::{NewUser, Role, User};
