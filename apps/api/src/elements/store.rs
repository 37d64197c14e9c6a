//! Queries over `resume_elements`. Every element kind shares the table, so
//! the typed functions here are generic over [`Element`] and keyed by `T::KIND`.

use anyhow::Context;
use resume_domain::{Element, ElementKind, Record};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::element::ElementRow;

fn decode<T: Element>(row: ElementRow) -> Result<Record<T>, AppError> {
    let id = row.id;
    row.into_record::<T>()
        .with_context(|| format!("stored {} {id} does not decode", T::KIND))
        .map_err(AppError::from)
}

fn not_found(kind: ElementKind) -> AppError {
    AppError::NotFound(format!("{} not found", kind.label()))
}

pub async fn list<T: Element>(db: &PgPool, user_id: Uuid) -> Result<Vec<Record<T>>, AppError> {
    let rows: Vec<ElementRow> = sqlx::query_as(
        "SELECT * FROM resume_elements WHERE user_id = $1 AND kind = $2 ORDER BY created_at",
    )
    .bind(user_id)
    .bind(T::KIND.as_str())
    .fetch_all(db)
    .await?;
    rows.into_iter().map(decode::<T>).collect()
}

/// Another user's element is reported as missing, never as forbidden.
pub async fn get<T: Element>(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<Record<T>, AppError> {
    let row: ElementRow = sqlx::query_as(
        "SELECT * FROM resume_elements WHERE id = $1 AND user_id = $2 AND kind = $3",
    )
    .bind(id)
    .bind(user_id)
    .bind(T::KIND.as_str())
    .fetch_optional(db)
    .await?
    .ok_or_else(|| not_found(T::KIND))?;
    decode(row)
}

/// Inserts an already validated payload.
pub async fn insert<'e, T: Element>(
    db: impl PgExecutor<'e>,
    user_id: Uuid,
    data: &T,
) -> Result<Record<T>, AppError> {
    let payload = serde_json::to_value(data).context("element payload does not serialize")?;
    let row: ElementRow = sqlx::query_as(
        r#"
        INSERT INTO resume_elements (user_id, kind, data)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(T::KIND.as_str())
    .bind(payload)
    .fetch_one(db)
    .await?;
    decode(row)
}

/// Applies `update` to the stored payload, re-validates the result and saves it.
pub async fn update<T: Element>(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    update: T::Update,
) -> Result<Record<T>, AppError> {
    let mut record = get::<T>(db, user_id, id).await?;
    record.data.apply_update(update);
    record.data.validate()?;

    let payload = serde_json::to_value(&record.data).context("element payload does not serialize")?;
    let row: ElementRow = sqlx::query_as(
        r#"
        UPDATE resume_elements
        SET data = $4, updated_at = NOW()
        WHERE id = $1 AND user_id = $2 AND kind = $3
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(T::KIND.as_str())
    .bind(payload)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| not_found(T::KIND))?;
    decode(row)
}

pub async fn delete<T: Element>(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    let result =
        sqlx::query("DELETE FROM resume_elements WHERE id = $1 AND user_id = $2 AND kind = $3")
            .bind(id)
            .bind(user_id)
            .bind(T::KIND.as_str())
            .execute(db)
            .await?;
    if result.rows_affected() == 0 {
        return Err(not_found(T::KIND));
    }
    Ok(())
}

/// Every element the user owns, any kind, oldest first.
pub async fn all_rows(db: &PgPool, user_id: Uuid) -> Result<Vec<ElementRow>, AppError> {
    Ok(
        sqlx::query_as("SELECT * FROM resume_elements WHERE user_id = $1 ORDER BY created_at")
            .bind(user_id)
            .fetch_all(db)
            .await?,
    )
}

/// The subset of `ids` the user owns, in no particular order.
pub async fn owned_rows(db: &PgPool, user_id: Uuid, ids: &[Uuid]) -> Result<Vec<ElementRow>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(
        sqlx::query_as("SELECT * FROM resume_elements WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id)
            .bind(ids)
            .fetch_all(db)
            .await?,
    )
}

/// Element count per kind for the user.
pub async fn counts(db: &PgPool, user_id: Uuid) -> Result<Vec<(String, i64)>, AppError> {
    Ok(sqlx::query_as(
        "SELECT kind, COUNT(*) FROM resume_elements WHERE user_id = $1 GROUP BY kind",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?)
}

/// Decodes rows of one kind, keeping the order of `rows`.
pub fn decode_rows<T: Element>(rows: &[ElementRow]) -> Result<Vec<Record<T>>, AppError> {
    rows.iter()
        .filter(|row| row.kind == T::KIND.as_str())
        .cloned()
        .map(decode::<T>)
        .collect()
}
