//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use tokio::task;
use tracing::info;

use crate::authz;
use crate::config::SecurityConfig;
use crate::db::repositories::user::hash_password;
use crate::db::{Store, UsernameChange};
use crate::models::user::{Identity, Role, User, validate_username};
use crate::services::user_service::{UserError, UserService, UserWithStats};

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    fn check_password_strength(&self, password: &str) -> Result<(), UserError> {
        if password.chars().count() < self.security.min_password_length {
            return Err(UserError::Validation(format!(
                "Password must be at least {} characters",
                self.security.min_password_length
            )));
        }
        Ok(())
    }

    /// Argon2 is CPU-bound; hash off the async runtime.
    async fn hash(&self, password: &str) -> Result<String, UserError> {
        let password = password.to_string();
        let config = self.security.clone();
        task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .map_err(|e| UserError::Internal(format!("Password hashing task panicked: {e}")))?
            .map_err(UserError::from)
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(&self, username: &str, password: &str) -> Result<User, UserError> {
        let username = validate_username(username).map_err(UserError::Validation)?;
        self.check_password_strength(password)?;

        // Friendly pre-check; the unique index is the real guard.
        if self.store.get_user_by_username(username).await?.is_some() {
            return Err(UserError::Conflict("Username already exists".to_string()));
        }

        let password_hash = self.hash(password).await?;

        let user = self
            .store
            .create_user(username, &password_hash)
            .await?
            .ok_or_else(|| UserError::Conflict("Username already exists".to_string()))?;

        info!(user = %user.username, role = %user.role, "Registered new account");
        Ok(user)
    }

    async fn login(&self, username: &str, password: &str) -> Result<User, UserError> {
        self.store
            .verify_credentials(username, password)
            .await?
            .ok_or(UserError::InvalidCredentials)
    }

    async fn get_user(&self, id: i32) -> Result<User, UserError> {
        self.store.get_user(id).await?.ok_or(UserError::NotFound)
    }

    async fn update_username(
        &self,
        actor_id: i32,
        new_username: &str,
    ) -> Result<User, UserError> {
        let new_username = validate_username(new_username).map_err(UserError::Validation)?;

        if let Some(existing) = self.store.get_user_by_username(new_username).await?
            && existing.id != actor_id
        {
            return Err(UserError::Conflict("Username already taken".to_string()));
        }

        match self.store.update_username(actor_id, new_username).await? {
            UsernameChange::Updated(user) => Ok(user),
            UsernameChange::NotFound => Err(UserError::NotFound),
            UsernameChange::Taken => {
                Err(UserError::Conflict("Username already taken".to_string()))
            }
        }
    }

    async fn change_password(
        &self,
        actor_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), UserError> {
        self.check_password_strength(new_password)?;

        if current_password == new_password {
            return Err(UserError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let is_valid = self
            .store
            .verify_password_by_id(actor_id, current_password)
            .await?;
        if !is_valid {
            return Err(UserError::InvalidCredentials);
        }

        let new_hash = self.hash(new_password).await?;
        if !self.store.update_password_hash(actor_id, &new_hash).await? {
            return Err(UserError::NotFound);
        }

        info!(user_id = actor_id, "Password changed");
        Ok(())
    }

    async fn list_users(&self, actor: &Identity) -> Result<Vec<UserWithStats>, UserError> {
        if !authz::can_list_users(actor.role) {
            return Err(UserError::Forbidden);
        }

        let users = self.store.list_users().await?;
        let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
        let counts = self.store.count_anime_by_owner_ids(&ids).await?;

        Ok(users
            .into_iter()
            .map(|user| {
                let anime_count = counts.get(&user.id).copied().unwrap_or(0);
                UserWithStats { user, anime_count }
            })
            .collect())
    }

    async fn update_role(
        &self,
        actor: &Identity,
        target_id: i32,
        role: Role,
    ) -> Result<User, UserError> {
        authz::check_change_role(actor, target_id)?;

        let user = self
            .store
            .update_user_role(target_id, role)
            .await?
            .ok_or(UserError::NotFound)?;

        info!(actor = %actor.username, target = %user.username, role = %role, "Role changed");
        Ok(user)
    }

    async fn delete_user(&self, actor: &Identity, target_id: i32) -> Result<(), UserError> {
        // Actor-side screen before the lookup: an unprivileged caller
        // gets Forbidden whether or not the id exists.
        authz::check_delete_user_actor(actor, target_id)?;

        let target = self
            .store
            .get_user(target_id)
            .await?
            .ok_or(UserError::NotFound)?;

        authz::check_delete_user(actor, target_id, target.role)?;

        // Single transaction, anime rows first; a cascade failure
        // rolls back the whole delete and surfaces as Internal so
        // operators know nothing was removed.
        let deleted = self
            .store
            .delete_user_cascade(target_id)
            .await
            .map_err(|e| UserError::Internal(format!("Deletion cascade failed: {e}")))?;
        if !deleted {
            return Err(UserError::NotFound);
        }

        info!(actor = %actor.username, target = %target.username, "Deleted account and its collection");
        Ok(())
    }
}
