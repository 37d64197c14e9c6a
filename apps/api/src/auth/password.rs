//! bcrypt hashing for passwords and one-time codes. Hashing is CPU-bound,
//! so it runs on the blocking pool.

use anyhow::Context;

use crate::errors::AppError;

pub async fn hash_secret(secret: &str) -> Result<String, AppError> {
    let secret = secret.to_string();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(secret, bcrypt::DEFAULT_COST))
        .await
        .context("hash task panicked")?
        .context("bcrypt hash failed")?;
    Ok(hashed)
}

/// `false` for a wrong secret or a malformed hash.
pub async fn verify_secret(secret: &str, hash: &str) -> Result<bool, AppError> {
    let secret = secret.to_string();
    let hash = hash.to_string();
    let ok = tokio::task::spawn_blocking(move || bcrypt::verify(secret, &hash).unwrap_or(false))
        .await
        .context("verify task panicked")?;
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_then_verify() {
        let hash = hash_secret("correct horse").await.unwrap();
        assert!(verify_secret("correct horse", &hash).await.unwrap());
        assert!(!verify_secret("wrong horse", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_a_mismatch() {
        assert!(!verify_secret("x", "not-a-hash").await.unwrap());
    }
}
