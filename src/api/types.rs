use serde::Serialize;

use crate::models::anime::{AiringStatus, AnimeEntry};
use crate::models::user::{Role, User};
use crate::services::{ProgressView, UserWithStats};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserWithStatsDto {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub anime_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserWithStats> for UserWithStatsDto {
    fn from(row: UserWithStats) -> Self {
        Self {
            id: row.user.id,
            username: row.user.username,
            role: row.user.role,
            anime_count: row.anime_count,
            created_at: row.user.created_at,
            updated_at: row.user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnimeDto {
    pub id: i32,
    pub title: String,
    pub season_distribution: Vec<i32>,
    pub episodes: i32,
    pub seasons: i32,
    pub rating: f32,
    pub status: AiringStatus,
    pub cover: String,
    pub description: String,
    pub watched_episodes: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<AnimeEntry> for AnimeDto {
    fn from(entry: AnimeEntry) -> Self {
        Self {
            id: entry.id,
            title: entry.title,
            season_distribution: entry.season_distribution,
            episodes: entry.episodes,
            seasons: entry.seasons,
            rating: entry.rating,
            status: entry.status,
            cover: entry.cover,
            description: entry.description,
            watched_episodes: entry.watched_episodes,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProgressDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<i32>,
    pub watched_episodes: i32,
    pub total_episodes: i32,
}

impl From<ProgressView> for ProgressDto {
    fn from(view: ProgressView) -> Self {
        Self {
            season: view.season,
            episode: view.episode,
            watched_episodes: view.watched_episodes,
            total_episodes: view.total_episodes,
        }
    }
}
