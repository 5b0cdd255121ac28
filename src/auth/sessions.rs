//! Session authority: login issues a credential, logout revokes it.

use serde::Serialize;
use sqlx::SqlitePool;
use time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::auth::credentials;
use crate::auth::tokens::TokenCodec;
use crate::error::{AppError, AppResult};
use crate::identity::{self, UserSummary};

#[derive(Debug, Serialize)]
pub struct LoginOutcome {
    pub user: UserSummary,
    pub access_token: String,
    pub expires_at: i64,
}

/// Authenticate and open a fresh session.
///
/// Unknown email and wrong password take the same exit so the response
/// never reveals which check failed. Two concurrent logins by one user
/// produce two independent live sessions; that is allowed.
pub async fn login(
    pool: &SqlitePool,
    codec: &TokenCodec,
    ttl: Duration,
    email: &str,
    password: &str,
) -> AppResult<LoginOutcome> {
    let Some(user) = identity::find_by_email(pool, email).await? else {
        return Err(AppError::InvalidCredentials);
    };
    if !identity::verify_password(password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let user_id = Uuid::parse_str(&user.id)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("stored user id not a uuid: {e}")))?;
    let session_id = Uuid::now_v7();

    let (access_token, expires_at) = codec.issue(user_id, session_id, ttl);
    credentials::create(pool, session_id, &user.id, &access_token, expires_at).await?;

    info!(user_id = %user.id, session_id = %session_id, "session opened");

    Ok(LoginOutcome {
        user: UserSummary::from(&user),
        access_token,
        expires_at,
    })
}

/// Revoke the caller's own session. The revoked token keeps verifying
/// structurally until it expires, but the middleware cross-check rejects it
/// from the next request on.
pub async fn logout(pool: &SqlitePool, session_id: Uuid, owner_id: Uuid) -> AppResult<()> {
    credentials::revoke(pool, session_id, owner_id).await?;
    info!(user_id = %owner_id, session_id = %session_id, "session revoked");
    Ok(())
}
