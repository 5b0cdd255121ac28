mod credentials;
mod middleware;
mod sessions;
mod tokens;

pub use credentials::Credential;
pub use middleware::AuthUser;
pub use sessions::{LoginOutcome, login, logout};
pub use tokens::{Claims, TokenCodec, TokenError};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router, debug_handler};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::AppResult;
use crate::{AppState, identity};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
}

#[derive(Deserialize)]
struct RegisterRequest {
    email: String,
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[debug_handler]
async fn register(
    State(db_pool): State<SqlitePool>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let user = identity::create(&db_pool, &req.email, &req.username, &req.password).await?;

    info!(user_id = %user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "user created successfully",
            "data": user,
        })),
    ))
}

#[debug_handler]
async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = login(
        &state.db_pool,
        &state.tokens,
        state.token_ttl,
        &req.email,
        &req.password,
    )
    .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "login successful",
        "data": outcome,
    })))
}

#[debug_handler(state = AppState)]
async fn logout_handler(
    State(db_pool): State<SqlitePool>,
    auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    logout(&db_pool, auth.session_id, auth.user_id).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "user logged out successfully",
        "data": {},
    })))
}
