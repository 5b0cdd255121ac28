//! Signed session tokens.
//!
//! A token is `base64url(claims json) . base64url(hmac-sha256 signature)`.
//! Issuing and verifying are pure functions of the shared secret; the
//! live-session cross-check against storage happens in the middleware, not
//! here.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    InvalidFormat,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("token decode error: {0}")]
    DecodeError(String),
}

/// Verified contents of a token. Only `TokenCodec::verify` produces one,
/// so holding a `Claims` means signature and expiry already checked out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub session_id: Uuid,
    /// Absolute expiry, unix seconds.
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: secret.to_vec(),
        }
    }

    /// Build a signed token for `user_id` bound to `session_id`, expiring
    /// `ttl` from now. Returns the token and its expiry timestamp.
    pub fn issue(&self, user_id: Uuid, session_id: Uuid, ttl: Duration) -> (String, i64) {
        let expires_at = (OffsetDateTime::now_utc() + ttl).unix_timestamp();
        let claims = Claims {
            user_id,
            session_id,
            expires_at,
        };

        let payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).expect("serialize claims"));
        let signature = self.sign(payload.as_bytes());

        (format!("{payload}.{signature}"), expires_at)
    }

    /// Check signature integrity and expiry. Callers collapse every failure
    /// into one client-facing `Unauthenticated` kind; the distinct variants
    /// exist for logging only.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::InvalidFormat)?;
        if payload.is_empty() || signature.is_empty() || signature.contains('.') {
            return Err(TokenError::InvalidFormat);
        }

        if self.sign(payload.as_bytes()) != signature {
            return Err(TokenError::InvalidSignature);
        }

        let raw = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| TokenError::DecodeError(e.to_string()))?;
        let claims: Claims =
            serde_json::from_slice(&raw).map_err(|e| TokenError::DecodeError(e.to_string()))?;

        if claims.expires_at <= OffsetDateTime::now_utc().unix_timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn sign(&self, payload: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(payload);
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenCodec([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &[u8] = b"test-secret-key-for-signing";

    fn codec() -> TokenCodec {
        TokenCodec::new(TEST_SECRET)
    }

    #[test]
    fn issue_then_verify_roundtrip() {
        let user_id = Uuid::now_v7();
        let session_id = Uuid::now_v7();

        let (token, expires_at) = codec().issue(user_id, session_id, Duration::minutes(5));
        let claims = codec().verify(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.session_id, session_id);
        assert_eq!(claims.expires_at, expires_at);
    }

    #[test]
    fn wrong_secret_rejected() {
        let (token, _) = codec().issue(Uuid::now_v7(), Uuid::now_v7(), Duration::minutes(5));

        let other = TokenCodec::new(b"a-different-secret");
        assert!(matches!(
            other.verify(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn tampered_payload_rejected() {
        let (token, _) = codec().issue(Uuid::now_v7(), Uuid::now_v7(), Duration::minutes(5));

        let (payload, signature) = token.split_once('.').unwrap();
        let mut forged_payload = payload.to_string();
        forged_payload.push('A');
        let forged = format!("{forged_payload}.{signature}");

        assert!(matches!(
            codec().verify(&forged),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn expired_token_rejected() {
        let (token, _) = codec().issue(Uuid::now_v7(), Uuid::now_v7(), Duration::minutes(-5));

        assert!(matches!(codec().verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn malformed_tokens_rejected() {
        for garbage in ["", "no-dot-here", ".", "a.b.c", "only-payload."] {
            assert!(codec().verify(garbage).is_err(), "accepted {garbage:?}");
        }
    }
}
