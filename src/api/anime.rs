use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{AnimeDto, ApiError, ApiResponse, AppState, ProgressDto};
use crate::models::anime::{AnimePatch, NewAnime};
use crate::models::user::Identity;

#[derive(Deserialize)]
pub struct SetProgressRequest {
    pub season: i32,
    pub episode: i32,
}

/// GET /anime
/// The caller's whole collection, newest first.
pub async fn list_anime(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<AnimeDto>>>, ApiError> {
    let entries = state.anime.list(identity.id).await?;
    let dtos = entries.into_iter().map(AnimeDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

/// POST /anime
pub async fn add_anime(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<NewAnime>,
) -> Result<(StatusCode, Json<ApiResponse<AnimeDto>>), ApiError> {
    let entry = state.anime.create(identity.id, &payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(entry.into())),
    ))
}

/// GET /anime/{id}
pub async fn get_anime(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AnimeDto>>, ApiError> {
    let entry = state.anime.get(identity.id, id).await?;
    Ok(Json(ApiResponse::success(entry.into())))
}

/// PUT /anime/{id}
/// Partial update; absent fields are left untouched.
pub async fn update_anime(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
    Json(patch): Json<AnimePatch>,
) -> Result<Json<ApiResponse<AnimeDto>>, ApiError> {
    let entry = state.anime.update(identity.id, id, &patch).await?;
    Ok(Json(ApiResponse::success(entry.into())))
}

/// DELETE /anime/{id}
pub async fn remove_anime(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.anime.delete(identity.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /anime/{id}/progress
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ProgressDto>>, ApiError> {
    let view = state.anime.progress(identity.id, id).await?;
    Ok(Json(ApiResponse::success(view.into())))
}

/// PUT /anime/{id}/progress
/// Records a (season, episode-within-season) position.
pub async fn set_progress(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
    Json(payload): Json<SetProgressRequest>,
) -> Result<Json<ApiResponse<ProgressDto>>, ApiError> {
    let view = state
        .anime
        .set_progress(identity.id, id, payload.season, payload.episode)
        .await?;
    Ok(Json(ApiResponse::success(view.into())))
}
