use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AnimeError, UserError};

#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),

    InvalidCredentials(String),

    Unauthorized(String),

    Forbidden(String),

    NotFound(String),

    Conflict(String),

    /// Logically impossible request (self role change / self delete),
    /// regardless of privilege. Deliberately distinct from Forbidden.
    InvalidOperation(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::InvalidCredentials(msg) => write!(f, "Invalid credentials: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::InvalidCredentials(msg) | ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, msg.clone())
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::InvalidOperation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::InvalidCredentials => {
                ApiError::InvalidCredentials("Invalid credentials".to_string())
            }
            UserError::Conflict(msg) => ApiError::Conflict(msg),
            UserError::NotFound => ApiError::NotFound("User not found".to_string()),
            UserError::Forbidden => {
                ApiError::Forbidden("Insufficient privileges".to_string())
            }
            UserError::InvalidOperation(msg) => ApiError::InvalidOperation(msg),
            UserError::Validation(msg) => ApiError::ValidationError(msg),
            UserError::Database(msg) => ApiError::DatabaseError(msg),
            UserError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<AnimeError> for ApiError {
    fn from(err: AnimeError) -> Self {
        match err {
            AnimeError::NotFound => ApiError::NotFound("Anime entry not found".to_string()),
            AnimeError::Validation(msg) => ApiError::ValidationError(msg),
            AnimeError::Database(msg) => ApiError::DatabaseError(msg),
            AnimeError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}
