//! Error taxonomy for the whole service, with the HTTP status each kind
//! maps to. Handlers and stores return `AppResult` everywhere; nothing is
//! reported to clients except the stable kind + message pairs below.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Login failed. Deliberately identical for unknown email and wrong
    /// password so callers cannot enumerate accounts.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed, expired, revoked or mismatched token.
    #[error("{0}")]
    Unauthenticated(&'static str),

    /// Authenticated, but not allowed to touch this resource.
    #[error("user not authorized")]
    Forbidden,

    #[error("room does not exist")]
    RoomNotFound,

    #[error("user does not exist")]
    UserNotFound,

    #[error("user not in room")]
    NotMember,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("user already in room")]
    AlreadyMember,

    #[error("{0}")]
    Conflict(&'static str),

    /// Collaborator I/O failure. The cause is logged server-side and never
    /// exposed to clients.
    #[error("storage error")]
    Storage(#[from] sqlx::Error),

    #[error("internal error")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::RoomNotFound
            | AppError::UserNotFound
            | AppError::NotMember
            | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyMember | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            match &self {
                AppError::Storage(e) => error!(error = %e, "storage failure"),
                AppError::Internal(e) => error!(error = %e, "internal failure"),
                _ => {}
            }
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "status": "error",
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(AppError::InvalidCredentials.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthenticated("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::RoomNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::UserNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::NotMember.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::AlreadyMember.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::Conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Storage(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
