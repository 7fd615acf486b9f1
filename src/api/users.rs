use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, UserDto, UserWithStatsDto};
use crate::models::user::{Identity, Role};

#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// GET /users
/// Every account with its collection size. Owner/admin only.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<UserWithStatsDto>>>, ApiError> {
    let rows = state.users.list_users(&identity).await?;
    let dtos = rows.into_iter().map(UserWithStatsDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

/// PUT /users/{id}/role
/// Owner only; self-targeting is rejected as an invalid operation.
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.users.update_role(&identity, id, payload.role).await?;

    tracing::info!(
        "Role of user {} changed to {} by {}",
        user.username,
        user.role,
        identity.username
    );

    Ok(Json(ApiResponse::success(user.into())))
}

/// DELETE /users/{id}
/// Deletes the account and its whole collection.
pub async fn remove_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.users.delete_user(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
