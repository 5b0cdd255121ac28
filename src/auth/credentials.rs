//! Credential store: one `sessions` row per login.
//!
//! Rows are never hard-deleted. Revocation flips `is_live`; expiry is
//! advisory and only checked by the token codec, `is_live` is what the
//! middleware trusts.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Credential {
    pub id: String,
    pub owner_id: String,
    /// The exact token string issued for this session. A presented token
    /// must equal this byte-for-byte to pass the middleware cross-check.
    pub token: String,
    pub is_live: bool,
    pub expires_at: i64,
}

pub async fn create(
    pool: &SqlitePool,
    session_id: Uuid,
    owner_id: &str,
    token: &str,
    expires_at: i64,
) -> AppResult<()> {
    let result = sqlx::query(
        "INSERT INTO sessions (id, owner_id, token, is_live, expires_at, created_at)
         VALUES (?, ?, ?, 1, ?, ?)",
    )
    .bind(session_id.to_string())
    .bind(owner_id)
    .bind(token)
    .bind(expires_at)
    .bind(db::unix_now())
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        // Session ids are server-generated UUIDv7s; a collision is fatal to
        // the request, not something to retry.
        Err(e) if db::is_unique_violation(&e) => {
            Err(AppError::Conflict("session already exists"))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn get_by_id(pool: &SqlitePool, session_id: Uuid) -> AppResult<Credential> {
    sqlx::query_as::<_, Credential>(
        "SELECT id, owner_id, token, is_live, expires_at FROM sessions WHERE id = ?",
    )
    .bind(session_id.to_string())
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("session"))
}

/// Set `is_live = 0` for the owner's session. Revoking an already-revoked
/// session is a no-op success; a session that never existed for this owner
/// is `NotFound`.
pub async fn revoke(pool: &SqlitePool, session_id: Uuid, owner_id: Uuid) -> AppResult<()> {
    let result = sqlx::query("UPDATE sessions SET is_live = 0 WHERE id = ? AND owner_id = ?")
        .bind(session_id.to_string())
        .bind(owner_id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("session"));
    }

    Ok(())
}
