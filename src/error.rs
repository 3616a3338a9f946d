//! Application error taxonomy.
//!
//! Every fallible operation in the crate returns [`AppError`]. Variants carry a
//! human-readable `message` (safe to show to an operator) and a JSON `details`
//! payload for logs and callers that want structured context.

use serde_json::{Value, json};
use thiserror::Error;

/// Message shown for any missing or unreadable user record.
pub const USER_NOT_FOUND: &str = "user does not exist";

/// Message shown for any missing or unreadable short link record.
pub const LINK_NOT_FOUND: &str = "short link does not exist";

#[derive(Debug, Error)]
pub enum AppError {
    /// A required field was empty or malformed. The message names the field.
    #[error("{message}")]
    Validation { message: String, details: Value },

    /// The record does not exist or could not be decoded.
    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// A record with the same key already exists.
    #[error("{message}")]
    Conflict { message: String, details: Value },

    /// The key-value store was unreachable or rejected a command.
    #[error("{message}")]
    Infrastructure { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn infrastructure(message: impl Into<String>, details: Value) -> Self {
        Self::Infrastructure {
            message: message.into(),
            details,
        }
    }

    /// Stable machine-readable code for the variant.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::NotFound { .. } => "not_found",
            AppError::Conflict { .. } => "conflict",
            AppError::Infrastructure { .. } => "infrastructure_error",
        }
    }

    pub fn details(&self) -> &Value {
        match self {
            AppError::Validation { details, .. }
            | AppError::NotFound { details, .. }
            | AppError::Conflict { details, .. }
            | AppError::Infrastructure { details, .. } => details,
        }
    }
}

/// Maps a store failure to [`AppError::Infrastructure`], logging the operation and key.
pub fn map_store_error(op: &'static str, key: &str, e: impl std::fmt::Display) -> AppError {
    tracing::error!(op, key, error = %e, "key-value store command failed");
    AppError::infrastructure(
        "Key-value store error",
        json!({ "op": op, "key": key, "reason": e.to_string() }),
    )
}
