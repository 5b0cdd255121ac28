//! Resource authorization. Every domain mutation routes through here; no
//! handler compares owner ids or checks membership on its own.
//!
//! | action            | rule                                    |
//! |-------------------|-----------------------------------------|
//! | create room       | any authenticated user, becomes owner   |
//! | join room         | room + user exist, not already a member |
//! | leave room        | caller is a member                      |
//! | post/read messages| caller is a member                      |
//! | rename room       | caller is the owner                     |
//! | delete room       | caller is the owner, cascade is atomic  |
//! | in-room username  | caller edits only their own row         |

use sqlx::SqlitePool;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::rooms::msg::{self, Message};
use crate::rooms::store::{self, Room};
use crate::rooms::membership;

/// Creating a room does not join the creator to it; membership is a
/// separate explicit join. Kept as-is from the original product behavior.
pub async fn create_room(
    pool: &SqlitePool,
    owner_id: &str,
    name: &str,
    description: &str,
) -> AppResult<Room> {
    let room = store::create(pool, owner_id, name, description).await?;
    info!(room_id = %room.id, owner_id = %owner_id, "room created");
    Ok(room)
}

pub async fn join_room(
    pool: &SqlitePool,
    room_id: &str,
    user_id: &str,
    username: &str,
) -> AppResult<()> {
    membership::add(pool, room_id, user_id, username).await?;
    info!(room_id = %room_id, user_id = %user_id, "user joined room");
    Ok(())
}

pub async fn leave_room(pool: &SqlitePool, room_id: &str, user_id: &str) -> AppResult<()> {
    membership::remove(pool, room_id, user_id).await?;
    info!(room_id = %room_id, user_id = %user_id, "user left room");
    Ok(())
}

pub async fn update_room(
    pool: &SqlitePool,
    room_id: &str,
    caller_id: &str,
    name: &str,
    description: &str,
) -> AppResult<Room> {
    ensure_owner(pool, room_id, caller_id).await?;
    store::update(pool, room_id, name, description).await
}

pub async fn delete_room(pool: &SqlitePool, room_id: &str, caller_id: &str) -> AppResult<()> {
    ensure_owner(pool, room_id, caller_id).await?;
    store::delete_cascade(pool, room_id).await?;
    info!(room_id = %room_id, "room deleted");
    Ok(())
}

/// The ledger is keyed by `(room_id, caller)`, so a caller can only ever
/// touch their own in-room name.
pub async fn update_username(
    pool: &SqlitePool,
    room_id: &str,
    caller_id: &str,
    username: &str,
) -> AppResult<()> {
    membership::update_username(pool, room_id, caller_id, username).await
}

pub async fn post_message(
    pool: &SqlitePool,
    room_id: &str,
    author_id: &str,
    content: &str,
) -> AppResult<Message> {
    ensure_member(pool, room_id, author_id).await?;
    msg::insert(pool, room_id, author_id, content).await
}

pub async fn room_messages(
    pool: &SqlitePool,
    room_id: &str,
    user_id: &str,
) -> AppResult<Vec<Message>> {
    ensure_member(pool, room_id, user_id).await?;
    msg::list(pool, room_id).await
}

async fn ensure_owner(pool: &SqlitePool, room_id: &str, caller_id: &str) -> AppResult<Room> {
    let room = store::get(pool, room_id).await?.ok_or(AppError::RoomNotFound)?;
    if room.owner_id != caller_id {
        return Err(AppError::Forbidden);
    }
    Ok(room)
}

pub async fn ensure_member(pool: &SqlitePool, room_id: &str, user_id: &str) -> AppResult<()> {
    if !membership::is_member(pool, room_id, user_id).await? {
        return Err(AppError::NotMember);
    }
    Ok(())
}
