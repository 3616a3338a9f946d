//! User entity: an operator of the shortener and their password material.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::password;

/// Access level of a user, stored as an integer (`1` standard, `2` administrator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Role {
    #[default]
    Standard,
    Administrator,
}

impl From<Role> for u8 {
    fn from(role: Role) -> Self {
        match role {
            Role::Standard => 1,
            Role::Administrator => 2,
        }
    }
}

impl TryFrom<u8> for Role {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Role::Standard),
            2 => Ok(Role::Administrator),
            other => Err(format!("unknown role {other}")),
        }
    }
}

/// A stored user record.
///
/// Only the derived digest and its salt are kept; the raw password never
/// reaches this struct. Both byte fields serialize as standard base64.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub role: Role,
    #[serde(rename = "password", with = "password::base64_bytes")]
    pub password_digest: Vec<u8>,
    #[serde(with = "password::base64_bytes")]
    pub salt: Vec<u8>,
    #[serde(rename = "create_time")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }

    /// Returns true if `raw_password` derives to the stored digest.
    pub fn verify_password(&self, raw_password: &str) -> bool {
        password::verify_password(raw_password, &self.salt, &self.password_digest)
    }
}

/// Input for signing up a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub raw_password: String,
    pub role: Role,
}

impl NewUser {
    pub fn new(username: impl Into<String>, raw_password: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            raw_password: raw_password.into(),
            role,
        }
    }
}
