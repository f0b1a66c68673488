//! Admin gate for endpoints that expose scored leads.
//!
//! Callers present `Authorization: Bearer <token>`. The configured token is
//! kept only as a SHA-256 digest; the presented token is hashed the same way
//! and compared in constant time.

use axum::http::{header, HeaderMap};
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::errors::AppError;

/// Hex-encoded SHA-256 of a token.
pub fn digest_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Reject the request unless it carries the admin bearer token.
pub fn require_admin(config: &Config, headers: &HeaderMap) -> Result<(), AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = bearer_token(value)
        .ok_or_else(|| AppError::Unauthorized("Expected a Bearer token".to_string()))?;

    if !constant_time_compare(&digest_token(token), &config.admin_token_sha256) {
        tracing::warn!("Invalid admin token received");
        return Err(AppError::Unauthorized("Invalid admin token".to_string()));
    }

    Ok(())
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Both sides are fixed-length hex digests, so only content is compared.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
