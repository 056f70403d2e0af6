//! User registration and queries.

use std::sync::Arc;

use crate::db::UserStorage;
use crate::domain::{CreateUserRequest, ListUsersRequest, User};
use crate::error::Result;

/// Application service for the user collection.
pub struct UserService<S> {
    storage: Arc<S>,
}

impl<S: UserStorage> UserService<S> {
    pub const fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Register a new user: validate, hash the password, persist.
    ///
    /// # Errors
    ///
    /// Returns `Error::UserValidation` on invalid input, or a storage error.
    pub async fn register_user(&self, req: CreateUserRequest) -> Result<User> {
        tracing::info!(operation = "register_user", "registering new user");

        let user = req.into_user().inspect_err(|error| {
            tracing::error!(%error, "user request validation failed");
        })?;

        self.storage.create(&user).await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn list_users(&self, req: &ListUsersRequest) -> Result<Vec<User>> {
        tracing::debug!(
            operation = "list_users",
            ids_count = req.ids.len(),
            "fetching users"
        );
        self.storage.list(req).await
    }

    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn count_users(&self, req: &ListUsersRequest) -> Result<i64> {
        self.storage.count(req).await
    }
}
