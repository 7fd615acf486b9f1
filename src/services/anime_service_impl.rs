//! `SeaORM` implementation of the `AnimeService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{PatchOutcome, Store};
use crate::models::anime::{AnimeEntry, AnimePatch, NewAnime};
use crate::progress;
use crate::services::anime_service::{AnimeError, AnimeService, ProgressView};

pub struct SeaOrmAnimeService {
    store: Store,
}

impl SeaOrmAnimeService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// The fetch-merge-write (and its lost-update guard) lives in the
    /// repository; this just maps the outcome into the service error
    /// space. A row deleted mid-flight reports `NotFound` instead of
    /// being resurrected.
    async fn apply_patch(
        &self,
        owner_id: i32,
        id: i32,
        patch: &AnimePatch,
    ) -> Result<AnimeEntry, AnimeError> {
        match self.store.patch_anime(owner_id, id, patch).await? {
            PatchOutcome::Updated(entry) => Ok(entry),
            PatchOutcome::NotFound => Err(AnimeError::NotFound),
            PatchOutcome::Invalid(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl AnimeService for SeaOrmAnimeService {
    async fn create(&self, owner_id: i32, draft: &NewAnime) -> Result<AnimeEntry, AnimeError> {
        let validated = draft.validate()?;
        let entry = self.store.insert_anime(owner_id, &validated).await?;

        info!(owner_id, anime_id = entry.id, title = %entry.title, "Added anime entry");
        Ok(entry)
    }

    async fn get(&self, owner_id: i32, id: i32) -> Result<AnimeEntry, AnimeError> {
        self.store
            .get_anime(owner_id, id)
            .await?
            .ok_or(AnimeError::NotFound)
    }

    async fn list(&self, owner_id: i32) -> Result<Vec<AnimeEntry>, AnimeError> {
        Ok(self.store.list_anime(owner_id).await?)
    }

    async fn update(
        &self,
        owner_id: i32,
        id: i32,
        patch: &AnimePatch,
    ) -> Result<AnimeEntry, AnimeError> {
        self.apply_patch(owner_id, id, patch).await
    }

    async fn delete(&self, owner_id: i32, id: i32) -> Result<(), AnimeError> {
        if !self.store.delete_anime(owner_id, id).await? {
            return Err(AnimeError::NotFound);
        }
        info!(owner_id, anime_id = id, "Deleted anime entry");
        Ok(())
    }

    async fn progress(&self, owner_id: i32, id: i32) -> Result<ProgressView, AnimeError> {
        let entry = self
            .store
            .get_anime(owner_id, id)
            .await?
            .ok_or(AnimeError::NotFound)?;

        Ok(ProgressView::for_entry(&entry))
    }

    async fn set_progress(
        &self,
        owner_id: i32,
        id: i32,
        season: i32,
        episode: i32,
    ) -> Result<ProgressView, AnimeError> {
        let entry = self
            .store
            .get_anime(owner_id, id)
            .await?
            .ok_or(AnimeError::NotFound)?;

        if entry.season_distribution.is_empty() {
            return Err(AnimeError::Validation(
                "Progress tracking is unavailable for entries without seasons".to_string(),
            ));
        }

        let watched = progress::watched_total(season, episode, &entry.season_distribution)?;

        let updated = self
            .apply_patch(owner_id, id, &AnimePatch::set_watched(watched))
            .await?;

        Ok(ProgressView::for_entry(&updated))
    }
}
