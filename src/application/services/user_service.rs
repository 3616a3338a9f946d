//! User signup, lookup and password verification.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::entities::{NewUser, User};
use crate::domain::keys;
use crate::domain::repositories::KeyValueStore;
use crate::error::{AppError, USER_NOT_FOUND};
use crate::utils::password::{derive_password, generate_salt};

/// Service owning the `users` hash.
///
/// Users are created once and then only read; there is no update or delete.
pub struct UserService<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> UserService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns true if a user record exists for `username`.
    ///
    /// Fails closed: a store error is logged and reported as `false`. An empty
    /// username is never looked up.
    pub async fn exists(&self, username: &str) -> bool {
        if username.is_empty() {
            return false;
        }

        match self.store.hexists(keys::USERS, username).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(username, error = %e, "Failed to check whether user exists");
                false
            }
        }
    }

    /// Creates a user with a freshly salted password digest.
    ///
    /// The final write is `HSETNX`, so a user created concurrently between the
    /// existence check and the write is reported as a conflict instead of
    /// being overwritten.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if the username or password is empty
    /// - [`AppError::Conflict`] if the username is taken
    /// - [`AppError::Infrastructure`] if the store write fails
    pub async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        for (field, value) in [
            ("username", &new_user.username),
            ("password", &new_user.raw_password),
        ] {
            if value.is_empty() {
                return Err(AppError::bad_request(
                    format!("{field} is required"),
                    json!({ "field": field }),
                ));
            }
        }

        if self.exists(&new_user.username).await {
            return Err(user_conflict(&new_user.username));
        }

        let salt = generate_salt()?;
        let password_digest = derive_password(&new_user.raw_password, &salt)?;

        let user = User {
            username: new_user.username,
            role: new_user.role,
            password_digest,
            salt,
            created_at: Utc::now(),
        };

        let payload = serde_json::to_string(&user).map_err(|e| {
            AppError::infrastructure(
                "Failed to encode user",
                json!({ "username": user.username, "reason": e.to_string() }),
            )
        })?;

        if !self
            .store
            .hset_nx(keys::USERS, &user.username, &payload)
            .await?
        {
            return Err(user_conflict(&user.username));
        }

        info!(username = %user.username, role = ?user.role, "User created");
        Ok(user)
    }

    /// Loads a user by username.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] with a generic message if the username is
    ///   empty, the record is missing, or it cannot be decoded; the cause is
    ///   logged, not returned
    /// - [`AppError::Infrastructure`] if the store cannot be read
    pub async fn load(&self, username: &str) -> Result<User, AppError> {
        if username.is_empty() {
            return Err(AppError::not_found(USER_NOT_FOUND, json!({})));
        }

        let raw = match self.store.hget(keys::USERS, username).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                warn!(username, "User not found");
                return Err(AppError::not_found(USER_NOT_FOUND, json!({ "username": username })));
            }
            Err(e) => {
                warn!(username, error = %e, "Failed to read user");
                return Err(e);
            }
        };

        serde_json::from_str(&raw).map_err(|e| {
            warn!(username, error = %e, "Failed to decode user record");
            AppError::not_found(USER_NOT_FOUND, json!({ "username": username }))
        })
    }

    /// Loads a user and checks their password.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] with the same message whether the user is
    ///   missing or the password is wrong
    /// - [`AppError::Infrastructure`] if the store cannot be read
    pub async fn authenticate(&self, username: &str, raw_password: &str) -> Result<User, AppError> {
        let rejected = || {
            AppError::not_found(
                "invalid username or password",
                json!({ "username": username }),
            )
        };

        let user = match self.load(username).await {
            Ok(user) => user,
            Err(AppError::NotFound { .. }) => return Err(rejected()),
            Err(e) => return Err(e),
        };
        if !user.verify_password(raw_password) {
            warn!(username, "Password verification failed");
            return Err(rejected());
        }

        Ok(user)
    }
}

fn user_conflict(username: &str) -> AppError {
    AppError::conflict(
        format!("{username} already exists"),
        json!({ "username": username }),
    )
}
