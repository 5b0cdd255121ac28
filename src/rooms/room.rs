use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, debug_handler};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::rooms::{membership, policy, store};

#[derive(Deserialize)]
pub(crate) struct CreateRoomRequest {
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
pub(crate) struct JoinRoomRequest {
    username: String,
}

#[derive(Deserialize)]
pub(crate) struct UpdateRoomRequest {
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
pub(crate) struct UpdateUsernameRequest {
    username: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn create_room(
    State(db_pool): State<SqlitePool>,
    auth: AuthUser,
    Json(req): Json<CreateRoomRequest>,
) -> AppResult<impl IntoResponse> {
    let room = policy::create_room(
        &db_pool,
        &auth.user_id.to_string(),
        &req.name,
        &req.description,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "room created successfully",
            "data": room,
        })),
    ))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn list_rooms(
    State(db_pool): State<SqlitePool>,
    _auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    let mut rooms = store::list(&db_pool).await?;
    for room in &mut rooms {
        room.member_count = membership::count(&db_pool, &room.id).await?;
    }

    Ok(Json(json!({
        "status": "success",
        "message": "rooms retrieved successfully",
        "data": rooms,
    })))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn get_room(
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<Uuid>,
    _auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    let mut room = store::get(&db_pool, &room_id.to_string())
        .await?
        .ok_or(AppError::RoomNotFound)?;
    room.member_count = membership::count(&db_pool, &room.id).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "room retrieved successfully",
        "data": room,
    })))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn get_room_by_name(
    State(db_pool): State<SqlitePool>,
    Path(name): Path<String>,
    _auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    let mut room = store::get_by_name(&db_pool, &name)
        .await?
        .ok_or(AppError::RoomNotFound)?;
    room.member_count = membership::count(&db_pool, &room.id).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "room retrieved successfully",
        "data": room,
    })))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn update_room(
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<Uuid>,
    auth: AuthUser,
    Json(req): Json<UpdateRoomRequest>,
) -> AppResult<impl IntoResponse> {
    let room = policy::update_room(
        &db_pool,
        &room_id.to_string(),
        &auth.user_id.to_string(),
        &req.name,
        &req.description,
    )
    .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "room updated successfully",
        "data": room,
    })))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn delete_room(
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<Uuid>,
    auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    policy::delete_room(&db_pool, &room_id.to_string(), &auth.user_id.to_string()).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "room deleted successfully",
        "data": {},
    })))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn join_room(
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<Uuid>,
    auth: AuthUser,
    Json(req): Json<JoinRoomRequest>,
) -> AppResult<impl IntoResponse> {
    policy::join_room(
        &db_pool,
        &room_id.to_string(),
        &auth.user_id.to_string(),
        &req.username,
    )
    .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "room joined successfully",
        "data": {},
    })))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn leave_room(
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<Uuid>,
    auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    policy::leave_room(&db_pool, &room_id.to_string(), &auth.user_id.to_string()).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "user left room successfully",
        "data": {},
    })))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn update_username(
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<Uuid>,
    auth: AuthUser,
    Json(req): Json<UpdateUsernameRequest>,
) -> AppResult<impl IntoResponse> {
    policy::update_username(
        &db_pool,
        &room_id.to_string(),
        &auth.user_id.to_string(),
        &req.username,
    )
    .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "username updated successfully",
        "data": {},
    })))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn membership_check(
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<Uuid>,
    auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    let in_room = membership::is_member(
        &db_pool,
        &room_id.to_string(),
        &auth.user_id.to_string(),
    )
    .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "user checked successfully",
        "data": { "in_room": in_room },
    })))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn member_count(
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<Uuid>,
    _auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    let count = membership::count(&db_pool, &room_id.to_string()).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "room users count retrieved successfully",
        "data": { "count": count },
    })))
}
