pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod rooms;

use axum::extract::FromRef;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router, debug_handler};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;

use crate::auth::TokenCodec;

pub use error::{AppError, AppResult};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub tokens: TokenCodec,
    pub token_ttl: time::Duration,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::router())
        .nest("/rooms", rooms::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[debug_handler]
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "success",
        "message": "healthy",
    }))
}
