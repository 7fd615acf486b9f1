use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, UserDto};
use crate::models::user::Identity;

pub const SESSION_USER_KEY: &str = "user_id";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub username: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Session-cookie authentication middleware.
///
/// Re-reads the account on every request so a role change (or a
/// deletion) takes effect immediately, without waiting for re-login.
/// The resolved [`Identity`] is stored in the request extensions for
/// handlers to extract.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = match session.get::<i32>(SESSION_USER_KEY).await {
        Ok(Some(id)) => id,
        _ => {
            let response = (StatusCode::UNAUTHORIZED, "Unauthorized");
            return Ok(response.into_response());
        }
    };

    match state.users.get_user(user_id).await {
        Ok(user) => {
            tracing::Span::current().record("user_id", user.id);
            request.extensions_mut().insert(Identity::from(&user));
            Ok(next.run(request).await)
        }
        Err(_) => {
            // Stale session for a deleted account.
            let _ = session.flush().await;
            let response = (StatusCode::UNAUTHORIZED, "Unauthorized");
            Ok(response.into_response())
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create an account and start a session for it. The very first
/// account becomes the owner.
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let user = state
        .users
        .register(&payload.username, &payload.password)
        .await?;

    session
        .insert(SESSION_USER_KEY, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user.into()))))
}

/// POST /auth/login
/// Authenticate with username and password.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .users
        .login(&payload.username, &payload.password)
        .await?;

    // Rotate the session id on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to rotate session: {e}")))?;
    session
        .insert(SESSION_USER_KEY, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// POST /auth/logout
/// Invalidate the current session.
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, "Logged out")
}

/// GET /auth/me
/// Current account, as resolved by the auth middleware.
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.users.get_user(identity.id).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// PUT /auth/profile
/// Rename the calling account.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .users
        .update_username(identity.id, &payload.username)
        .await?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// PUT /auth/password
/// Change password after verifying the current one.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    axum::Extension(identity): axum::Extension<Identity>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .users
        .change_password(identity.id, &payload.current_password, &payload.new_password)
        .await?;

    tracing::info!("Password changed for user: {}", identity.username);

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated successfully".to_string(),
    })))
}
