use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entities::{anime, prelude::*};
use crate::models::anime::{AiringStatus, AnimeEntry, AnimePatch, InvalidAnime, ValidatedAnime};

/// Outcome of a patch write, separating "row missing or foreign" from
/// "patch invalid against the current row".
#[derive(Debug)]
pub enum PatchOutcome {
    Updated(AnimeEntry),
    NotFound,
    Invalid(InvalidAnime),
}

const PATCH_RETRY_LIMIT: usize = 3;

pub struct AnimeRepository {
    conn: DatabaseConnection,
}

impl AnimeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: anime::Model) -> AnimeEntry {
        AnimeEntry {
            id: model.id,
            owner_id: model.owner_id,
            title: model.title,
            season_distribution: serde_json::from_str(&model.season_distribution)
                .unwrap_or_default(),
            episodes: model.episodes,
            seasons: model.seasons,
            rating: model.rating,
            status: model.status.parse().unwrap_or(AiringStatus::Finished),
            cover: model.cover,
            description: model.description,
            watched_episodes: model.watched_episodes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub async fn insert(&self, owner_id: i32, draft: &ValidatedAnime) -> Result<AnimeEntry> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = anime::ActiveModel {
            owner_id: Set(owner_id),
            title: Set(draft.title.clone()),
            season_distribution: Set(serde_json::to_string(&draft.season_distribution)?),
            episodes: Set(draft.episodes),
            seasons: Set(draft.seasons),
            rating: Set(draft.rating),
            status: Set(draft.status.as_str().to_string()),
            cover: Set(draft.cover.clone()),
            description: Set(draft.description.clone()),
            watched_episodes: Set(draft.watched_episodes),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert anime entry")?;

        Ok(Self::map_model(model))
    }

    /// Owner-scoped lookup: an id belonging to another user behaves
    /// exactly like a missing id.
    pub async fn get(&self, owner_id: i32, id: i32) -> Result<Option<AnimeEntry>> {
        let model = Anime::find_by_id(id)
            .filter(anime::Column::OwnerId.eq(owner_id))
            .one(&self.conn)
            .await
            .context("Failed to query anime entry")?;

        Ok(model.map(Self::map_model))
    }

    pub async fn list(&self, owner_id: i32) -> Result<Vec<AnimeEntry>> {
        let rows = Anime::find()
            .filter(anime::Column::OwnerId.eq(owner_id))
            .order_by_desc(anime::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list anime entries")?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Fetch-merge-write guarded by the row version: the conditional
    /// write is additionally filtered on the `updated_at` value the
    /// merge was computed from, so an overlapping edit that landed in
    /// between makes this write miss, and the patch is re-merged
    /// against the fresh row instead of overwriting it with stale
    /// fields. Scoped by `(id, owner_id)` like every other access.
    pub async fn patch(&self, owner_id: i32, id: i32, patch: &AnimePatch) -> Result<PatchOutcome> {
        for _ in 0..PATCH_RETRY_LIMIT {
            let Some(model) = Anime::find_by_id(id)
                .filter(anime::Column::OwnerId.eq(owner_id))
                .one(&self.conn)
                .await
                .context("Failed to query anime entry")?
            else {
                return Ok(PatchOutcome::NotFound);
            };

            let read_version = model.updated_at.clone();
            let current = Self::map_model(model);
            let updated = match patch.apply(&current) {
                Ok(updated) => updated,
                Err(err) => return Ok(PatchOutcome::Invalid(err)),
            };

            let now = chrono::Utc::now().to_rfc3339();
            let result = Anime::update_many()
                .set(anime::ActiveModel {
                    title: Set(updated.title.clone()),
                    season_distribution: Set(serde_json::to_string(&updated.season_distribution)?),
                    episodes: Set(updated.episodes),
                    seasons: Set(updated.seasons),
                    rating: Set(updated.rating),
                    status: Set(updated.status.as_str().to_string()),
                    cover: Set(updated.cover.clone()),
                    description: Set(updated.description.clone()),
                    watched_episodes: Set(updated.watched_episodes),
                    updated_at: Set(now.clone()),
                    ..Default::default()
                })
                .filter(anime::Column::Id.eq(id))
                .filter(anime::Column::OwnerId.eq(owner_id))
                .filter(anime::Column::UpdatedAt.eq(read_version))
                .exec(&self.conn)
                .await
                .context("Failed to update anime entry")?;

            if result.rows_affected > 0 {
                return Ok(PatchOutcome::Updated(AnimeEntry {
                    updated_at: now,
                    ..updated
                }));
            }
            // Lost the race; loop re-reads and re-merges.
        }

        anyhow::bail!("Anime entry {id} kept changing during update")
    }

    pub async fn delete(&self, owner_id: i32, id: i32) -> Result<bool> {
        let result = Anime::delete_many()
            .filter(anime::Column::Id.eq(id))
            .filter(anime::Column::OwnerId.eq(owner_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete anime entry")?;

        Ok(result.rows_affected > 0)
    }

    /// Per-owner entry counts for the admin user listing, grouped in
    /// one query instead of one count per user.
    pub async fn count_by_owner_ids(&self, owner_ids: &[i32]) -> Result<HashMap<i32, i64>> {
        if owner_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, i64)> = Anime::find()
            .select_only()
            .column(anime::Column::OwnerId)
            .column_as(anime::Column::Id.count(), "count")
            .filter(anime::Column::OwnerId.is_in(owner_ids.to_vec()))
            .group_by(anime::Column::OwnerId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to count anime entries per owner")?;

        Ok(rows.into_iter().collect())
    }
}
