//! Domain service for the per-user anime collection.
//!
//! Every operation is scoped by the owner id; an entry belonging to a
//! different user is reported as missing, never as forbidden, so ids
//! leak no existence information across accounts.

use serde::Serialize;
use thiserror::Error;

use crate::models::anime::{AnimeEntry, AnimePatch, InvalidAnime, NewAnime};
use crate::progress::{self, ProgressError};

#[derive(Debug, Error)]
pub enum AnimeError {
    #[error("Anime entry not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AnimeError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AnimeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<InvalidAnime> for AnimeError {
    fn from(err: InvalidAnime) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<ProgressError> for AnimeError {
    fn from(err: ProgressError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Watch progress of one entry as the tracking UI consumes it.
///
/// `season`/`episode` are absent when the entry has no seasons;
/// progress tracking is unavailable for such entries.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressView {
    pub season: Option<i32>,
    pub episode: Option<i32>,
    pub watched_episodes: i32,
    pub total_episodes: i32,
}

impl ProgressView {
    #[must_use]
    pub fn for_entry(entry: &AnimeEntry) -> Self {
        let position = progress::season_position(
            entry.watched_episodes,
            &entry.season_distribution,
        );
        Self {
            season: position.map(|p| p.season),
            episode: position.map(|p| p.episode),
            watched_episodes: entry.watched_episodes,
            total_episodes: entry.episodes,
        }
    }
}

/// Domain service trait for collection CRUD and progress updates.
#[async_trait::async_trait]
pub trait AnimeService: Send + Sync {
    async fn create(&self, owner_id: i32, draft: &NewAnime) -> Result<AnimeEntry, AnimeError>;

    async fn get(&self, owner_id: i32, id: i32) -> Result<AnimeEntry, AnimeError>;

    async fn list(&self, owner_id: i32) -> Result<Vec<AnimeEntry>, AnimeError>;

    /// Applies a partial update. `episodes` is re-derived whenever the
    /// distribution changes, and `watched_episodes` is re-validated
    /// against the new total.
    async fn update(
        &self,
        owner_id: i32,
        id: i32,
        patch: &AnimePatch,
    ) -> Result<AnimeEntry, AnimeError>;

    async fn delete(&self, owner_id: i32, id: i32) -> Result<(), AnimeError>;

    /// Current watch position, mapped through the season partition.
    async fn progress(&self, owner_id: i32, id: i32) -> Result<ProgressView, AnimeError>;

    /// Records progress given a (season, episode-within-season) pair,
    /// converting it to the flat watched counter.
    async fn set_progress(
        &self,
        owner_id: i32,
        id: i32,
        season: i32,
        episode: i32,
    ) -> Result<ProgressView, AnimeError>;
}
