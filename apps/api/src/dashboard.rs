use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use resume_domain::dashboard::{
    merge_activity, AiLogEvent, DashboardResponse, DashboardStats, ElementCounts, RecentPdf,
    RecentResume, ACTIVITY_LIMIT, RECENT_LIMIT,
};
use resume_domain::ElementKind;
use sqlx::FromRow;
use tracing::warn;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::elements::store;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, FromRow)]
struct RecentResumeRow {
    id: Uuid,
    name: String,
    thumbnail_url: Option<String>,
    pdf_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RecentResumeRow> for RecentResume {
    fn from(row: RecentResumeRow) -> Self {
        RecentResume {
            id: row.id,
            name: row.name,
            thumbnail_url: row.thumbnail_url,
            pdf_url: row.pdf_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct RecentPdfRow {
    id: Uuid,
    custom_resume_id: Uuid,
    resume_name: String,
    pdf_url: String,
    thumbnail_url: Option<String>,
    compiled_at: DateTime<Utc>,
}

impl From<RecentPdfRow> for RecentPdf {
    fn from(row: RecentPdfRow) -> Self {
        RecentPdf {
            id: row.id,
            resume_id: row.custom_resume_id,
            resume_name: row.resume_name,
            pdf_url: row.pdf_url,
            thumbnail_url: row.thumbnail_url,
            generated_at: row.compiled_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct AiLogRow {
    action_type: String,
    section: String,
    created_at: DateTime<Utc>,
}

fn element_counts(rows: Vec<(String, i64)>) -> ElementCounts {
    let mut counts = ElementCounts::default();
    for (kind, count) in rows {
        match kind.parse::<ElementKind>() {
            Ok(kind) => counts.set(kind, count),
            Err(_) => warn!(%kind, "skipping unknown element kind in counts"),
        }
    }
    counts
}

/// GET /api/dashboard/
pub async fn dashboard(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<DashboardResponse>, AppError> {
    let resume_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM custom_resumes WHERE user_id = $1")
            .bind(user.id)
            .fetch_one(&state.db)
            .await?;

    let recent_resumes: Vec<RecentResume> = sqlx::query_as::<_, RecentResumeRow>(
        r#"
        SELECT id, name, thumbnail_url, pdf_url, created_at, updated_at
        FROM custom_resumes
        WHERE user_id = $1
        ORDER BY updated_at DESC
        LIMIT $2
        "#,
    )
    .bind(user.id)
    .bind(RECENT_LIMIT as i64)
    .fetch_all(&state.db)
    .await?
    .into_iter()
    .map(Into::into)
    .collect();

    let recent_pdfs: Vec<RecentPdf> = sqlx::query_as::<_, RecentPdfRow>(
        r#"
        SELECT id, custom_resume_id, resume_name, pdf_url, thumbnail_url, compiled_at
        FROM pdf_history
        WHERE user_id = $1 AND custom_resume_id IS NOT NULL
        ORDER BY compiled_at DESC
        LIMIT $2
        "#,
    )
    .bind(user.id)
    .bind(RECENT_LIMIT as i64)
    .fetch_all(&state.db)
    .await?
    .into_iter()
    .map(Into::into)
    .collect();

    let ai_logs: Vec<AiLogEvent> = sqlx::query_as::<_, AiLogRow>(
        r#"
        SELECT action_type, section, created_at
        FROM ai_usage_logs
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user.id)
    .bind(ACTIVITY_LIMIT as i64)
    .fetch_all(&state.db)
    .await?
    .into_iter()
    .map(|row| AiLogEvent {
        action_type: row.action_type,
        section: row.section,
        created_at: row.created_at,
    })
    .collect();

    let element_counts = element_counts(store::counts(&state.db, user.id).await?);
    let recent_activity = merge_activity(&recent_resumes, &recent_pdfs, &ai_logs);

    Ok(Json(DashboardResponse {
        stats: DashboardStats {
            credits: user.credits,
            max_resume: user.max_resume,
            resume_count,
            pdfs_generated: user.pdfs_generated_count,
            ai_calls_count: user.ai_calls_count,
        },
        recent_resumes,
        recent_pdfs,
        element_counts,
        recent_activity,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard", get(dashboard))
        .route("/api/dashboard/", get(dashboard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_counts_by_kind() {
        let counts = element_counts(vec![
            ("project".to_string(), 4),
            ("skill".to_string(), 2),
            ("mystery".to_string(), 9),
        ]);
        assert_eq!(counts.projects, 4);
        assert_eq!(counts.skills, 2);
        assert_eq!(counts.total(), 6);
    }
}
