//! Credit balance changes. Every mutation is a single conditional UPDATE so
//! concurrent requests can never drive a balance below zero.

use sqlx::{PgConnection, PgExecutor, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

/// Takes `amount` credits from the user. Fails with `InsufficientCredits`
/// (carrying the current balance) without touching the row if too few remain.
/// Runs on a connection so callers can bill inside their own transaction.
pub async fn deduct(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: i64,
) -> Result<i64, AppError> {
    let remaining: Option<(i64,)> = sqlx::query_as(
        r#"
        UPDATE users
        SET credits = credits - $2, updated_at = NOW()
        WHERE id = $1 AND credits >= $2
        RETURNING credits
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .fetch_optional(&mut *conn)
    .await?;

    match remaining {
        Some((credits,)) => {
            info!(%user_id, amount, credits, "credits deducted");
            Ok(credits)
        }
        None => Err(AppError::InsufficientCredits {
            required: amount,
            available: balance(&mut *conn, user_id).await?,
        }),
    }
}

/// Fails early when the user cannot afford `amount`, before paid work starts.
/// The later [`deduct`] still has the final say.
pub async fn ensure(db: &PgPool, user_id: Uuid, amount: i64) -> Result<(), AppError> {
    let available = balance(db, user_id).await?;
    if available < amount {
        return Err(AppError::InsufficientCredits {
            required: amount,
            available,
        });
    }
    Ok(())
}

pub async fn add<'e>(db: impl PgExecutor<'e>, user_id: Uuid, amount: i64) -> Result<i64, AppError> {
    let (credits,): (i64,) = sqlx::query_as(
        "UPDATE users SET credits = credits + $2, updated_at = NOW() WHERE id = $1 RETURNING credits",
    )
    .bind(user_id)
    .bind(amount)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(credits)
}

pub async fn balance<'e>(db: impl PgExecutor<'e>, user_id: Uuid) -> Result<i64, AppError> {
    let (credits,): (i64,) = sqlx::query_as("SELECT credits FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(credits)
}
