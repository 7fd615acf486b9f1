use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait,
};
use tracing::info;

use crate::entities::{anime, users};
use crate::models::anime::{AnimeEntry, AnimePatch, ValidatedAnime};
use crate::models::user::{Role, User};

pub mod migrator;
pub mod repositories;

pub use repositories::anime::PatchOutcome;
pub use repositories::user::UsernameChange;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Each pooled connection to an in-memory sqlite gets its own
        // database, so the pool must stay at a single connection there.
        let (max_connections, min_connections) = if db_url.contains(":memory:") {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn anime_repo(&self) -> repositories::anime::AnimeRepository {
        repositories::anime::AnimeRepository::new(self.conn.clone())
    }

    // ---- users ----

    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<Option<User>> {
        self.user_repo()
            .create_with_bootstrap_role(username, password_hash)
            .await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list_all().await
    }

    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>> {
        self.user_repo().verify_credentials(username, password).await
    }

    pub async fn verify_password_by_id(&self, id: i32, password: &str) -> Result<bool> {
        self.user_repo().verify_password_by_id(id, password).await
    }

    pub async fn update_password_hash(&self, id: i32, new_hash: &str) -> Result<bool> {
        self.user_repo().update_password_hash(id, new_hash).await
    }

    pub async fn update_username(&self, id: i32, new_username: &str) -> Result<UsernameChange> {
        self.user_repo().update_username(id, new_username).await
    }

    pub async fn update_user_role(&self, id: i32, role: Role) -> Result<Option<User>> {
        self.user_repo().update_role(id, role).await
    }

    /// Deletes a user and every anime entry it owns in one
    /// transaction, anime rows first: if anything fails mid-sequence
    /// the whole delete rolls back rather than leaving a user row
    /// pointing at nothing.
    pub async fn delete_user_cascade(&self, id: i32) -> Result<bool> {
        let deleted = self
            .conn
            .transaction::<_, bool, sea_orm::DbErr>(move |txn| {
                Box::pin(async move {
                    anime::Entity::delete_many()
                        .filter(anime::Column::OwnerId.eq(id))
                        .exec(txn)
                        .await?;

                    let result = users::Entity::delete_by_id(id).exec(txn).await?;
                    Ok(result.rows_affected > 0)
                })
            })
            .await
            .context("User deletion cascade failed")?;

        Ok(deleted)
    }

    // ---- anime ----

    pub async fn insert_anime(&self, owner_id: i32, draft: &ValidatedAnime) -> Result<AnimeEntry> {
        self.anime_repo().insert(owner_id, draft).await
    }

    pub async fn get_anime(&self, owner_id: i32, id: i32) -> Result<Option<AnimeEntry>> {
        self.anime_repo().get(owner_id, id).await
    }

    pub async fn list_anime(&self, owner_id: i32) -> Result<Vec<AnimeEntry>> {
        self.anime_repo().list(owner_id).await
    }

    /// Version-guarded merge of a partial update; see
    /// [`repositories::anime::AnimeRepository::patch`].
    pub async fn patch_anime(
        &self,
        owner_id: i32,
        id: i32,
        patch: &AnimePatch,
    ) -> Result<PatchOutcome> {
        self.anime_repo().patch(owner_id, id, patch).await
    }

    pub async fn delete_anime(&self, owner_id: i32, id: i32) -> Result<bool> {
        self.anime_repo().delete(owner_id, id).await
    }

    pub async fn count_anime_by_owner_ids(&self, owner_ids: &[i32]) -> Result<HashMap<i32, i64>> {
        self.anime_repo().count_by_owner_ids(owner_ids).await
    }
}
