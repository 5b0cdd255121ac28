//! Identity store: registered users and their password hashes.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: i64,
}

/// Client-facing view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub username: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
        }
    }
}

pub async fn create(
    pool: &SqlitePool,
    email: &str,
    username: &str,
    password: &str,
) -> AppResult<UserSummary> {
    let email = email.to_lowercase();
    let id = Uuid::now_v7().to_string();
    let password_hash = hash_password(password)?;

    let result = sqlx::query(
        "INSERT INTO users (id, email, username, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&email)
    .bind(username)
    .bind(&password_hash)
    .bind(db::unix_now())
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(UserSummary {
            id,
            email,
            username: username.to_string(),
        }),
        Err(e) if db::is_unique_violation(&e) => {
            Err(AppError::Conflict("user already exists with the given email"))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, username, password_hash, created_at FROM users WHERE email = ?",
    )
    .bind(email.to_lowercase())
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn exists(pool: &SqlitePool, user_id: &str) -> AppResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hash failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("hunter2", "not-a-phc-string"));
    }
}
