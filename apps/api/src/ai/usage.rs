use resume_domain::ai::AiAction;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::credits;
use crate::errors::AppError;

/// What a finished model call cost and who it was for.
pub struct Charge<'a> {
    pub user_id: Uuid,
    pub action: AiAction,
    pub section: &'a str,
    pub item_id: Option<Uuid>,
    pub credits: i64,
    pub tokens_used: i64,
}

/// Bills a model call that already succeeded: deducts the credits, logs the
/// usage row and bumps the user's AI counters in one transaction, so a failed
/// log write leaves the balance untouched. Returns the remaining balance.
pub async fn charge(db: &PgPool, c: Charge<'_>) -> Result<i64, AppError> {
    let mut tx = db.begin().await?;
    let remaining = credits::deduct(&mut tx, c.user_id, c.credits).await?;

    sqlx::query(
        r#"
        INSERT INTO ai_usage_logs (user_id, action_type, section, item_id, tokens_used)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(c.user_id)
    .bind(c.action.as_str())
    .bind(c.section)
    .bind(c.item_id)
    .bind(c.tokens_used)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE users
        SET ai_calls_count = ai_calls_count + 1,
            tokens_used = tokens_used + $2,
            last_ai_call_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(c.user_id)
    .bind(c.tokens_used)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(
        user_id = %c.user_id,
        action = %c.action,
        tokens = c.tokens_used,
        credits_remaining = remaining,
        "ai call billed"
    );
    Ok(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn new_user(pool: &PgPool) -> Uuid {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name)
            VALUES ('billing@example.com', 'x', 'Asha', 'Rao')
            RETURNING id
            "#,
        )
        .fetch_one(pool)
        .await
        .unwrap();
        id
    }

    fn rephrase(user_id: Uuid, section: &str) -> Charge<'_> {
        Charge {
            user_id,
            action: AiAction::RephraseTitle,
            section,
            item_id: None,
            credits: 2,
            tokens_used: 120,
        }
    }

    #[ignore = "needs a Postgres DATABASE_URL"]
    #[sqlx::test]
    async fn test_failed_log_write_keeps_credits(pool: PgPool) {
        let user_id = new_user(&pool).await;

        // Postgres rejects NUL bytes in TEXT, so the usage log insert fails.
        let err = charge(&pool, rephrase(user_id, "experience\0")).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(credits::balance(&pool, user_id).await.unwrap(), 10);

        let remaining = charge(&pool, rephrase(user_id, "experience")).await.unwrap();
        assert_eq!(remaining, 8);
        let (calls, logs): (i64, i64) = sqlx::query_as(
            "SELECT ai_calls_count, (SELECT COUNT(*) FROM ai_usage_logs) FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!((calls, logs), (1, 1));
    }
}
