use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, debug_handler};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db;
use crate::error::AppResult;
use crate::rooms::policy;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Message {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: i64,
}

pub(crate) async fn insert(
    pool: &SqlitePool,
    room_id: &str,
    user_id: &str,
    content: &str,
) -> AppResult<Message> {
    let id = Uuid::now_v7().to_string();
    let created_at = db::unix_now();

    sqlx::query(
        "INSERT INTO messages (id, room_id, user_id, content, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(room_id)
    .bind(user_id)
    .bind(content)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(Message {
        id,
        room_id: room_id.to_string(),
        user_id: user_id.to_string(),
        content: content.to_string(),
        created_at,
    })
}

pub(crate) async fn list(pool: &SqlitePool, room_id: &str) -> AppResult<Vec<Message>> {
    // v7 ids are time-sortable, which keeps same-second messages in
    // insertion order
    let messages = sqlx::query_as::<_, Message>(
        "SELECT id, room_id, user_id, content, created_at FROM messages
         WHERE room_id = ? ORDER BY created_at, id",
    )
    .bind(room_id)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

#[derive(Deserialize)]
pub(crate) struct PostMessageRequest {
    content: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn post_message(
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<Uuid>,
    auth: AuthUser,
    Json(req): Json<PostMessageRequest>,
) -> AppResult<impl IntoResponse> {
    let message = policy::post_message(
        &db_pool,
        &room_id.to_string(),
        &auth.user_id.to_string(),
        &req.content,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "message": "message added successfully",
            "data": message,
        })),
    ))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn room_messages(
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<Uuid>,
    auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    let messages =
        policy::room_messages(&db_pool, &room_id.to_string(), &auth.user_id.to_string()).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "room messages fetched successfully",
        "data": messages,
    })))
}
