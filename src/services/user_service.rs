//! Domain service for accounts: registration, login verification,
//! profile changes, and the role-gated admin operations.

use serde::Serialize;
use thiserror::Error;

use crate::authz::AccessError;
use crate::models::user::{Identity, Role, User};

/// Errors specific to account operations.
///
/// `InvalidOperation` (self-targeting) is distinct from `Forbidden`
/// (missing privilege); the API maps them to different status codes.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(String),

    #[error("User not found")]
    NotFound,

    #[error("Insufficient privileges")]
    Forbidden,

    #[error("{0}")]
    InvalidOperation(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<AccessError> for UserError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Forbidden => Self::Forbidden,
            AccessError::SelfTarget => Self::InvalidOperation(err.to_string()),
        }
    }
}

/// A user row in the admin listing, enriched with the size of its
/// collection.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithStats {
    #[serde(flatten)]
    pub user: User,
    pub anime_count: i64,
}

/// Domain service trait for account management.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Creates an account. The very first account ever created becomes
    /// `owner`; all later ones are plain `user`s.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Conflict`] when the username is already
    /// taken (case-insensitively).
    async fn register(&self, username: &str, password: &str) -> Result<User, UserError>;

    /// Verifies credentials and returns the account.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::InvalidCredentials`] for an unknown
    /// username or a wrong password, indistinguishably.
    async fn login(&self, username: &str, password: &str) -> Result<User, UserError>;

    async fn get_user(&self, id: i32) -> Result<User, UserError>;

    /// Renames the calling account.
    async fn update_username(&self, actor_id: i32, new_username: &str)
    -> Result<User, UserError>;

    /// Changes the password after verifying the current one; performs
    /// no mutation on mismatch.
    async fn change_password(
        &self,
        actor_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), UserError>;

    /// Lists every account with its collection size. Owner/admin only.
    async fn list_users(&self, actor: &Identity) -> Result<Vec<UserWithStats>, UserError>;

    /// Changes another account's role. Owner only, never self.
    async fn update_role(
        &self,
        actor: &Identity,
        target_id: i32,
        role: Role,
    ) -> Result<User, UserError>;

    /// Deletes another account and cascades to its anime entries.
    async fn delete_user(&self, actor: &Identity, target_id: i32) -> Result<(), UserError>;
}
