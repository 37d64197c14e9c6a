//! Issuing and revoking login sessions. A session is an access token in the
//! response body plus a refresh token in a cookie; only a SHA-256 of the
//! refresh token is stored.

use anyhow::Context;
use axum::http::HeaderValue;
use resume_domain::account::TokenResponse;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::cookies::refresh_cookie;
use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub fn token_response(user: &UserRow, access_token: String) -> TokenResponse {
    TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        credits: user.credits,
        is_admin: user.is_admin,
    }
}

/// Issues both tokens for `user`, stores the refresh token and returns the
/// `Set-Cookie` value alongside the response body.
pub async fn start(state: &AppState, user: &UserRow) -> Result<(HeaderValue, TokenResponse), AppError> {
    let access = state
        .jwt
        .issue_access(user.id)
        .context("failed to sign access token")?;
    let refresh = state
        .jwt
        .issue_refresh(user.id)
        .context("failed to sign refresh token")?;

    sqlx::query("INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
        .bind(user.id)
        .bind(hash_token(&refresh.token))
        .bind(refresh.expires_at)
        .execute(&state.db)
        .await?;
    touch(&state.db, user.id).await?;

    Ok((
        refresh_cookie(&state.config, &refresh.token),
        token_response(user, access.token),
    ))
}

/// Marks the user as active now; feeds the admin "active in 30 days" figure.
pub async fn touch(db: &PgPool, user_id: Uuid) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET last_active_at = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn revoke_one(db: &PgPool, token: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
        .bind(hash_token(token))
        .execute(db)
        .await?;
    Ok(())
}

pub async fn revoke_all(db: &PgPool, user_id: Uuid) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_stable_hex() {
        let a = hash_token("abc");
        assert_eq!(a.len(), 64);
        assert_eq!(a, hash_token("abc"));
        assert_ne!(a, hash_token("abd"));
        assert_eq!(
            a,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
