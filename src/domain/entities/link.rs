//! Short link entity representing a redirect mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short link record as stored under `link:<id>`.
///
/// `id` is empty until an identifier has been allocated. Timestamps stay
/// `None` until the first successful save.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShortLink {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "is_enable", default)]
    pub is_enabled: bool,
    pub created_by: String,
    #[serde(rename = "create_time", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "update_time", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ShortLink {
    /// Creates an enabled, not yet identified link owned by `created_by`.
    pub fn new(
        url: impl Into<String>,
        description: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            url: url.into(),
            description: description.into(),
            is_enabled: true,
            created_by: created_by.into(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Returns true once an identifier has been allocated.
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// Applies the mutable fields of `patch`. Identity and ownership are untouched.
    pub fn apply(&mut self, patch: LinkPatch) {
        self.url = patch.url;
        self.description = patch.description;
        self.is_enabled = patch.is_enabled;
    }
}

/// Replacement values for the mutable fields of a link.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkPatch {
    pub url: String,
    pub description: String,
    pub is_enabled: bool,
}
