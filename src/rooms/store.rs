//! Room records. Ownership is a plain attribute set at creation; the
//! policy layer is the only place it is ever compared against a caller.

use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub created_at: i64,
    /// Display-only; filled in by callers from the membership ledger.
    #[sqlx(default)]
    pub member_count: i64,
}

pub async fn create(
    pool: &SqlitePool,
    owner_id: &str,
    name: &str,
    description: &str,
) -> AppResult<Room> {
    let id = Uuid::now_v7().to_string();
    let created_at = db::unix_now();

    let result = sqlx::query(
        "INSERT INTO rooms (id, name, description, owner_id, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(name)
    .bind(description)
    .bind(owner_id)
    .bind(created_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(Room {
            id,
            name: name.to_string(),
            description: description.to_string(),
            owner_id: owner_id.to_string(),
            created_at,
            member_count: 0,
        }),
        Err(e) if db::is_unique_violation(&e) => {
            Err(AppError::Conflict("room name already exists"))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn get(pool: &SqlitePool, room_id: &str) -> AppResult<Option<Room>> {
    let room = sqlx::query_as::<_, Room>(
        "SELECT id, name, description, owner_id, created_at FROM rooms WHERE id = ?",
    )
    .bind(room_id)
    .fetch_optional(pool)
    .await?;

    Ok(room)
}

pub async fn get_by_name(pool: &SqlitePool, name: &str) -> AppResult<Option<Room>> {
    let room = sqlx::query_as::<_, Room>(
        "SELECT id, name, description, owner_id, created_at FROM rooms WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(room)
}

pub async fn list(pool: &SqlitePool) -> AppResult<Vec<Room>> {
    let rooms = sqlx::query_as::<_, Room>(
        "SELECT id, name, description, owner_id, created_at FROM rooms ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rooms)
}

pub async fn exists(pool: &SqlitePool, room_id: &str) -> AppResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms WHERE id = ?")
        .bind(room_id)
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

pub async fn update(
    pool: &SqlitePool,
    room_id: &str,
    name: &str,
    description: &str,
) -> AppResult<Room> {
    let result = sqlx::query("UPDATE rooms SET name = ?, description = ? WHERE id = ?")
        .bind(name)
        .bind(description)
        .bind(room_id)
        .execute(pool)
        .await;

    match result {
        Ok(_) => get(pool, room_id).await?.ok_or(AppError::RoomNotFound),
        Err(e) if db::is_unique_violation(&e) => {
            Err(AppError::Conflict("room name already exists"))
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove a room together with all its memberships, atomically. Either
/// every membership row and the room row go, or the rollback leaves all of
/// them in place.
pub async fn delete_cascade(pool: &SqlitePool, room_id: &str) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM room_members WHERE room_id = ?")
        .bind(room_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM messages WHERE room_id = ?")
        .bind(room_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM rooms WHERE id = ?")
        .bind(room_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
