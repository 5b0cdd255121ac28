//! Per-request authorization gate.
//!
//! Extracting `AuthUser` runs the full pipeline: bearer token out of the
//! header, codec verification, credential lookup, and the live-session
//! cross-check. Nothing is cached between requests, so a logout is honored
//! on the very next request even for tokens that still verify structurally.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use tracing::debug;
use uuid::Uuid;

use crate::AppState;
use crate::auth::credentials;
use crate::error::AppError;

/// Verified identity attached to a request. Immutable; downstream handlers
/// thread it explicitly into the policy layer instead of reaching into any
/// shared request context.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub session_id: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or(AppError::Unauthenticated("token could not be found"))?;

        let claims = state.tokens.verify(&token).map_err(|e| {
            debug!(error = %e, "token rejected");
            AppError::Unauthenticated("token is invalid")
        })?;

        let credential = credentials::get_by_id(&state.db_pool, claims.session_id)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::Unauthenticated("token is invalid"),
                other => other,
            })?;

        // The stored token must match byte-for-byte: after a logout or a
        // re-login the presented token's signature and expiry still verify,
        // and only this check rejects it.
        if credential.token != token
            || credential.owner_id != claims.user_id.to_string()
            || !credential.is_live
        {
            return Err(AppError::Unauthenticated("session is invalid"));
        }

        Ok(AuthUser {
            user_id: claims.user_id,
            session_id: claims.session_id,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}
