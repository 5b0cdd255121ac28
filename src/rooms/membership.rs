//! Membership ledger: who is in which room, under what in-room name.
//!
//! The `(room_id, user_id)` primary key is the correctness guarantee for
//! concurrent joins; the existence pre-checks in `add` only exist to hand
//! back precise error kinds.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::db;
use crate::error::{AppError, AppResult};
use crate::identity;
use crate::rooms::store;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Membership {
    pub room_id: String,
    pub user_id: String,
    /// Room-local display name, distinct from the identity's global one.
    pub username: String,
    pub created_at: i64,
}

pub async fn add(
    pool: &SqlitePool,
    room_id: &str,
    user_id: &str,
    username: &str,
) -> AppResult<()> {
    if !identity::exists(pool, user_id).await? {
        return Err(AppError::UserNotFound);
    }
    if !store::exists(pool, room_id).await? {
        return Err(AppError::RoomNotFound);
    }
    if is_member(pool, room_id, user_id).await? {
        return Err(AppError::AlreadyMember);
    }

    let result = sqlx::query(
        "INSERT INTO room_members (room_id, user_id, username, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(room_id)
    .bind(user_id)
    .bind(username)
    .bind(db::unix_now())
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        // Lost a race with a concurrent join for the same pair.
        Err(e) if db::is_unique_violation(&e) => Err(AppError::AlreadyMember),
        Err(e) => Err(e.into()),
    }
}

pub async fn remove(pool: &SqlitePool, room_id: &str, user_id: &str) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM room_members WHERE room_id = ? AND user_id = ?")
        .bind(room_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotMember);
    }

    Ok(())
}

pub async fn update_username(
    pool: &SqlitePool,
    room_id: &str,
    user_id: &str,
    username: &str,
) -> AppResult<()> {
    if !is_member(pool, room_id, user_id).await? {
        return Err(AppError::NotMember);
    }

    let result = sqlx::query(
        "UPDATE room_members SET username = ? WHERE room_id = ? AND user_id = ?",
    )
    .bind(username)
    .bind(room_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Internal(anyhow::anyhow!(
            "failed to update username"
        )));
    }

    Ok(())
}

/// Display count; unknown rooms count as 0 rather than failing. Never used
/// for authorization decisions.
pub async fn count(pool: &SqlitePool, room_id: &str) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM room_members WHERE room_id = ?")
        .bind(room_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

pub async fn is_member(pool: &SqlitePool, room_id: &str, user_id: &str) -> AppResult<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM room_members WHERE room_id = ? AND user_id = ?",
    )
    .bind(room_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Memberships for a room, oldest join first.
pub async fn list_by_room(pool: &SqlitePool, room_id: &str) -> AppResult<Vec<Membership>> {
    let members = sqlx::query_as::<_, Membership>(
        "SELECT room_id, user_id, username, created_at FROM room_members
         WHERE room_id = ? ORDER BY created_at, rowid",
    )
    .bind(room_id)
    .fetch_all(pool)
    .await?;

    Ok(members)
}
