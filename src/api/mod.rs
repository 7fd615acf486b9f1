use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AnimeService, SeaOrmAnimeService, SeaOrmUserService, UserService,
};

mod anime;
pub mod auth;
mod error;
mod types;
mod users;

pub use error::ApiError;
pub use types::*;

pub struct AppState {
    pub store: Store,

    pub users: Arc<dyn UserService>,

    pub anime: Arc<dyn AnimeService>,

    pub config: Config,
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let users: Arc<dyn UserService> = Arc::new(SeaOrmUserService::new(
        store.clone(),
        config.security.clone(),
    ));
    let anime: Arc<dyn AnimeService> = Arc::new(SeaOrmAnimeService::new(store.clone()));

    Ok(Arc::new(AppState {
        store,
        users,
        anime,
        config,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();
    let session_minutes = state.config.server.session_minutes;

    let protected_routes = create_protected_router(state.clone());

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(session_minutes)));

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .layer(session_layer)
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/profile", put(auth::update_profile))
        .route("/auth/password", put(auth::change_password))
        .route("/anime", get(anime::list_anime))
        .route("/anime", post(anime::add_anime))
        .route("/anime/{id}", get(anime::get_anime))
        .route("/anime/{id}", put(anime::update_anime))
        .route("/anime/{id}", delete(anime::remove_anime))
        .route("/anime/{id}/progress", get(anime::get_progress))
        .route("/anime/{id}/progress", put(anime::set_progress))
        .route("/users", get(users::list_users))
        .route("/users/{id}/role", put(users::update_role))
        .route("/users/{id}", delete(users::remove_user))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
