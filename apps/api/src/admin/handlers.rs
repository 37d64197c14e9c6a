use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use resume_domain::account::normalize_email;
use resume_domain::admin::{
    AdminActionResponse, AdminAiUsageResponse, AdminPdfStatsResponse, AdminStatsResponse,
    AdminUserDetail, AdminUsersResponse, AiUsageStats, CreditsMode, PdfStats, PlatformStats,
    PromoteAdminRequest, UpdateCreditsRequest,
};
use resume_domain::ai::AiUsageEntry;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::auth::{session, AdminUser};
use crate::errors::{AppError, AppJson};
use crate::models::ai::AiUsageLogRow;
use crate::models::user::{self, UserRow};
use crate::state::AppState;

const DEFAULT_PAGE: i64 = 100;
const MAX_PAGE: i64 = 500;
const DETAIL_LOG_LIMIT: i64 = 50;
const ACTIVE_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Default, Deserialize)]
pub struct Page {
    skip: Option<i64>,
    limit: Option<i64>,
}

impl Page {
    fn offset(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE)
    }
}

fn parse_user_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::BadRequest("Invalid user ID format".into()))
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

async fn load_user(db: &PgPool, id: Uuid) -> Result<UserRow, AppError> {
    user::find_by_id(db, id).await?.ok_or_else(user_not_found)
}

/// Admins act on other accounts only.
fn refuse_self(admin: &UserRow, target: Uuid, action: &str) -> Result<(), AppError> {
    if admin.id == target {
        return Err(AppError::BadRequest(format!("You cannot {action} your own account")));
    }
    Ok(())
}

/// GET /api/admin/users?skip=&limit=
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(page): Query<Page>,
) -> Result<Json<AdminUsersResponse>, AppError> {
    let rows: Vec<UserRow> =
        sqlx::query_as("SELECT * FROM users ORDER BY created_at DESC OFFSET $1 LIMIT $2")
            .bind(page.offset())
            .bind(page.limit())
            .fetch_all(&state.db)
            .await?;
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&state.db)
        .await?;
    Ok(Json(AdminUsersResponse {
        users: rows.iter().map(UserRow::admin_view).collect(),
        total,
    }))
}

/// GET /api/admin/stats
pub async fn stats(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<AdminStatsResponse>, AppError> {
    let since = Utc::now() - Duration::days(ACTIVE_WINDOW_DAYS);
    let (total_users, active_users_last_30_days): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COUNT(*) FILTER (
                   WHERE last_ai_call_at >= $1
                      OR last_pdf_generated_at >= $1
                      OR last_active_at >= $1
               )
        FROM users
        "#,
    )
    .bind(since)
    .fetch_one(&state.db)
    .await?;
    let (total_ai_calls, total_tokens_used): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(tokens_used), 0)::BIGINT FROM ai_usage_logs",
    )
    .fetch_one(&state.db)
    .await?;
    let (total_pdfs_generated, total_pdfs_downloaded): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(downloaded_at) FROM pdf_history",
    )
    .fetch_one(&state.db)
    .await?;

    Ok(Json(AdminStatsResponse {
        stats: PlatformStats {
            total_users,
            total_ai_calls,
            total_tokens_used,
            total_pdfs_generated,
            total_pdfs_downloaded,
            active_users_last_30_days,
        },
    }))
}

#[derive(Debug, FromRow)]
struct PdfStatsRow {
    user_id: Uuid,
    user_email: String,
    pdfs_generated: i64,
    pdfs_downloaded: i64,
    last_generated_at: Option<DateTime<Utc>>,
}

impl From<PdfStatsRow> for PdfStats {
    fn from(row: PdfStatsRow) -> Self {
        PdfStats {
            user_id: row.user_id,
            user_email: row.user_email,
            pdfs_generated: row.pdfs_generated,
            pdfs_downloaded: row.pdfs_downloaded,
            last_generated_at: row.last_generated_at,
        }
    }
}

/// GET /api/admin/user/:id
pub async fn user_detail(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(raw_id): Path<String>,
) -> Result<Json<AdminUserDetail>, AppError> {
    let id = parse_user_id(&raw_id)?;
    let target = load_user(&state.db, id).await?;

    let ai_usage: Vec<AiUsageEntry> = sqlx::query_as::<_, AiUsageLogRow>(
        "SELECT * FROM ai_usage_logs WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(id)
    .bind(DETAIL_LOG_LIMIT)
    .fetch_all(&state.db)
    .await?
    .into_iter()
    .map(Into::into)
    .collect();

    let pdf_stats: PdfStatsRow = sqlx::query_as(
        r#"
        SELECT $1::UUID AS user_id,
               $2::TEXT AS user_email,
               COUNT(*) AS pdfs_generated,
               COUNT(downloaded_at) AS pdfs_downloaded,
               MAX(compiled_at) AS last_generated_at
        FROM pdf_history
        WHERE user_id = $1
        "#,
    )
    .bind(id)
    .bind(&target.email)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(AdminUserDetail {
        user: target.admin_view(),
        ai_usage,
        pdf_stats: pdf_stats.into(),
    }))
}

#[derive(Debug, FromRow)]
struct AiUsageStatsRow {
    user_id: Uuid,
    user_email: String,
    total_calls: i64,
    total_tokens: i64,
    last_call_at: Option<DateTime<Utc>>,
}

/// GET /api/admin/ai-usage?skip=&limit=
pub async fn ai_usage(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(page): Query<Page>,
) -> Result<Json<AdminAiUsageResponse>, AppError> {
    let rows: Vec<AiUsageStatsRow> = sqlx::query_as(
        r#"
        SELECT l.user_id,
               u.email AS user_email,
               COUNT(*) AS total_calls,
               COALESCE(SUM(l.tokens_used), 0)::BIGINT AS total_tokens,
               MAX(l.created_at) AS last_call_at
        FROM ai_usage_logs l
        JOIN users u ON u.id = l.user_id
        GROUP BY l.user_id, u.email
        ORDER BY total_calls DESC
        OFFSET $1 LIMIT $2
        "#,
    )
    .bind(page.offset())
    .bind(page.limit())
    .fetch_all(&state.db)
    .await?;
    let (total_calls, total_tokens): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(tokens_used), 0)::BIGINT FROM ai_usage_logs",
    )
    .fetch_one(&state.db)
    .await?;

    Ok(Json(AdminAiUsageResponse {
        usage: rows
            .into_iter()
            .map(|row| AiUsageStats {
                user_id: row.user_id,
                user_email: row.user_email,
                total_calls: row.total_calls,
                total_tokens: row.total_tokens,
                last_call_at: row.last_call_at,
            })
            .collect(),
        total_calls,
        total_tokens,
    }))
}

/// GET /api/admin/pdf-stats?skip=&limit=
pub async fn pdf_stats(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(page): Query<Page>,
) -> Result<Json<AdminPdfStatsResponse>, AppError> {
    let rows: Vec<PdfStatsRow> = sqlx::query_as(
        r#"
        SELECT p.user_id,
               u.email AS user_email,
               COUNT(*) AS pdfs_generated,
               COUNT(p.downloaded_at) AS pdfs_downloaded,
               MAX(p.compiled_at) AS last_generated_at
        FROM pdf_history p
        JOIN users u ON u.id = p.user_id
        GROUP BY p.user_id, u.email
        ORDER BY pdfs_generated DESC
        OFFSET $1 LIMIT $2
        "#,
    )
    .bind(page.offset())
    .bind(page.limit())
    .fetch_all(&state.db)
    .await?;
    let (total_generated, total_downloaded): (i64, i64) =
        sqlx::query_as("SELECT COUNT(*), COUNT(downloaded_at) FROM pdf_history")
            .fetch_one(&state.db)
            .await?;

    Ok(Json(AdminPdfStatsResponse {
        stats: rows.into_iter().map(Into::into).collect(),
        total_generated,
        total_downloaded,
    }))
}

/// POST /api/admin/create-admin
///
/// Promotes an existing account; there is no way to create one from here.
pub async fn promote(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppJson(req): AppJson<PromoteAdminRequest>,
) -> Result<(StatusCode, Json<AdminActionResponse>), AppError> {
    let email = normalize_email(&req.email);
    let target = user::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(user_not_found)?;
    if target.is_admin {
        return Err(AppError::BadRequest("User is already an admin".into()));
    }
    sqlx::query("UPDATE users SET is_admin = TRUE, updated_at = NOW() WHERE id = $1")
        .bind(target.id)
        .execute(&state.db)
        .await?;

    info!(admin_id = %admin.id, user_id = %target.id, "user promoted to admin");
    let mut response = AdminActionResponse::new("User promoted to admin successfully", target.id);
    response.is_admin = Some(true);
    Ok((StatusCode::CREATED, Json(response)))
}

/// DELETE /api/admin/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(raw_id): Path<String>,
) -> Result<Json<AdminActionResponse>, AppError> {
    let id = parse_user_id(&raw_id)?;
    refuse_self(&admin, id, "delete")?;

    // owned rows go with the user via ON DELETE CASCADE
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(user_not_found());
    }

    info!(admin_id = %admin.id, user_id = %id, "user deleted");
    Ok(Json(AdminActionResponse::new("User deleted successfully", id)))
}

async fn set_revoked(
    state: &AppState,
    admin: &UserRow,
    raw_id: &str,
    revoked: bool,
) -> Result<AdminActionResponse, AppError> {
    let id = parse_user_id(raw_id)?;
    if revoked {
        refuse_self(admin, id, "revoke")?;
    }
    let target = load_user(&state.db, id).await?;
    match (revoked, target.is_revoked) {
        (true, true) => return Err(AppError::BadRequest("User is already revoked".into())),
        (false, false) => return Err(AppError::BadRequest("User is not revoked".into())),
        _ => {}
    }

    sqlx::query("UPDATE users SET is_revoked = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(revoked)
        .execute(&state.db)
        .await?;
    let message = if revoked {
        let sessions = session::revoke_all(&state.db, id).await?;
        info!(admin_id = %admin.id, user_id = %id, sessions, "user access revoked");
        "User access revoked successfully"
    } else {
        info!(admin_id = %admin.id, user_id = %id, "user access restored");
        "User access restored successfully"
    };

    let mut response = AdminActionResponse::new(message, id);
    response.is_revoked = Some(revoked);
    Ok(response)
}

/// POST /api/admin/users/:id/revoke
pub async fn revoke(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(raw_id): Path<String>,
) -> Result<Json<AdminActionResponse>, AppError> {
    Ok(Json(set_revoked(&state, &admin, &raw_id, true).await?))
}

/// POST /api/admin/users/:id/unrevoke
pub async fn unrevoke(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(raw_id): Path<String>,
) -> Result<Json<AdminActionResponse>, AppError> {
    Ok(Json(set_revoked(&state, &admin, &raw_id, false).await?))
}

/// PUT /api/admin/users/:id/credits
pub async fn update_credits(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(raw_id): Path<String>,
    AppJson(req): AppJson<UpdateCreditsRequest>,
) -> Result<Json<AdminActionResponse>, AppError> {
    let id = parse_user_id(&raw_id)?;
    let credits: Option<i64> = match req.mode {
        CreditsMode::Set => {
            if req.credits < 0 {
                return Err(AppError::BadRequest("Credits must be non-negative".into()));
            }
            sqlx::query_scalar(
                "UPDATE users SET credits = $2, updated_at = NOW() WHERE id = $1 RETURNING credits",
            )
            .bind(id)
            .bind(req.credits)
            .fetch_optional(&state.db)
            .await?
        }
        CreditsMode::Adjust => {
            let updated: Option<i64> = sqlx::query_scalar(
                r#"
                UPDATE users SET credits = credits + $2, updated_at = NOW()
                WHERE id = $1 AND credits + $2 >= 0
                RETURNING credits
                "#,
            )
            .bind(id)
            .bind(req.credits)
            .fetch_optional(&state.db)
            .await?;
            if updated.is_none() {
                // distinguish a missing user from an overdraft
                let current = load_user(&state.db, id).await?;
                return Err(AppError::BadRequest(format!(
                    "Credits cannot go below zero (current balance {})",
                    current.credits
                )));
            }
            updated
        }
    };
    let credits = credits.ok_or_else(user_not_found)?;

    info!(admin_id = %admin.id, user_id = %id, credits, mode = ?req.mode, "credits updated");
    let mut response = AdminActionResponse::new("User credits updated successfully", id);
    response.credits = Some(credits);
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds() {
        let page = Page {
            skip: Some(-5),
            limit: Some(10_000),
        };
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), MAX_PAGE);
        assert_eq!(Page::default().limit(), DEFAULT_PAGE);
    }

    #[test]
    fn test_invalid_user_id() {
        assert!(matches!(
            parse_user_id("42"),
            Err(AppError::BadRequest(msg)) if msg == "Invalid user ID format"
        ));
    }
}
