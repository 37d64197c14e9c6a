use chrono::{DateTime, Utc};
use resume_domain::account::{UserAnalytics, UserProfile};
use resume_domain::admin::AdminUser;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    pub is_verified: bool,
    pub is_revoked: bool,
    pub credits: i64,
    pub max_resume: i64,
    pub ai_calls_count: i64,
    pub tokens_used: i64,
    pub pdfs_generated_count: i64,
    pub pdfs_downloaded_count: i64,
    pub last_ai_call_at: Option<DateTime<Utc>>,
    pub last_pdf_generated_at: Option<DateTime<Utc>>,
    pub last_active_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            is_admin: self.is_admin,
            is_verified: self.is_verified,
            credits: self.credits,
            max_resume: self.max_resume,
            created_at: self.created_at,
        }
    }

    pub fn analytics(&self) -> UserAnalytics {
        UserAnalytics {
            ai_calls_count: self.ai_calls_count,
            tokens_used: self.tokens_used,
            pdfs_generated_count: self.pdfs_generated_count,
            pdfs_downloaded_count: self.pdfs_downloaded_count,
            last_ai_call_at: self.last_ai_call_at,
            last_pdf_generated_at: self.last_pdf_generated_at,
        }
    }

    pub fn admin_view(&self) -> AdminUser {
        AdminUser {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            is_admin: self.is_admin,
            is_verified: self.is_verified,
            is_revoked: self.is_revoked,
            credits: self.credits,
            max_resume: self.max_resume,
            created_at: self.created_at,
            analytics: self.analytics(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

pub async fn find_by_id(pool: &sqlx::PgPool, id: Uuid) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// `email` must already be normalised.
pub async fn find_by_email(
    pool: &sqlx::PgPool,
    email: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}
