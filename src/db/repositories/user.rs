use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::users;
use crate::models::user::{Role, User};

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            // Rows are only written through Role::as_str.
            role: model.role.parse().unwrap_or(Role::User),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Outcome of a username change; `Taken` covers both the friendly
/// pre-check and the unique-index race backstop.
#[derive(Debug)]
pub enum UsernameChange {
    Updated(User),
    NotFound,
    Taken,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Creates an account, deciding the role inside the same
    /// transaction as the insert: the very first account becomes
    /// `owner`, every later one `user`. Concurrent first registrations
    /// therefore cannot both observe an empty table and both win.
    ///
    /// Returns `None` when the username is already taken
    /// (case-insensitively, via the `username_lower` unique index).
    pub async fn create_with_bootstrap_role(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>> {
        let username = username.to_string();
        let password_hash = password_hash.to_string();

        let model = self
            .conn
            .transaction::<_, Option<users::Model>, sea_orm::DbErr>(move |txn| {
                Box::pin(async move {
                    let existing = users::Entity::find().count(txn).await?;
                    let role = if existing == 0 { Role::Owner } else { Role::User };
                    let now = chrono::Utc::now().to_rfc3339();

                    let active = users::ActiveModel {
                        username: Set(username.clone()),
                        username_lower: Set(username.to_lowercase()),
                        password_hash: Set(password_hash),
                        role: Set(role.as_str().to_string()),
                        created_at: Set(now.clone()),
                        updated_at: Set(now),
                        ..Default::default()
                    };

                    match active.insert(txn).await {
                        Ok(model) => Ok(Some(model)),
                        Err(e)
                            if matches!(
                                e.sql_err(),
                                Some(SqlErr::UniqueConstraintViolation(_))
                            ) =>
                        {
                            Ok(None)
                        }
                        Err(e) => Err(e),
                    }
                })
            })
            .await
            .context("Registration transaction failed")?;

        Ok(model.map(User::from))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Case-insensitive lookup by username.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::UsernameLower.eq(username.to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    pub async fn list_all(&self) -> Result<Vec<User>> {
        let rows = users::Entity::find()
            .order_by_desc(users::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Verify credentials for login. Returns the user on success,
    /// `None` for an unknown username or a wrong password; the two are
    /// indistinguishable to the caller.
    ///
    /// Note: this uses `spawn_blocking` because Argon2 verification is
    /// CPU-intensive and would block the async runtime if run directly.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::UsernameLower.eq(username.to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || verify_hash(&password, &password_hash))
            .await
            .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }

    /// Verify the current password of a known account (password change).
    pub async fn verify_password_by_id(&self, id: i32, password: &str) -> Result<bool> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let password_hash = user.password_hash;
        let password = password.to_string();

        task::spawn_blocking(move || verify_hash(&password, &password_hash))
            .await
            .context("Password verification task panicked")?
    }

    /// Replace the stored password hash.
    pub async fn update_password_hash(&self, id: i32, new_hash: &str) -> Result<bool> {
        let Some(user) = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
        else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash.to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }

    pub async fn update_username(&self, id: i32, new_username: &str) -> Result<UsernameChange> {
        let Some(user) = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for username update")?
        else {
            return Ok(UsernameChange::NotFound);
        };

        let mut active: users::ActiveModel = user.into();
        active.username = Set(new_username.to_string());
        active.username_lower = Set(new_username.to_lowercase());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        match active.update(&self.conn).await {
            Ok(model) => Ok(UsernameChange::Updated(User::from(model))),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(UsernameChange::Taken)
            }
            Err(e) => Err(e).context("Failed to update username"),
        }
    }

    pub async fn update_role(&self, id: i32, role: Role) -> Result<Option<User>> {
        let Some(user) = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for role update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.role = Set(role.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let model = active.update(&self.conn).await?;

        Ok(Some(User::from(model)))
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the library defaults.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

fn verify_hash(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
