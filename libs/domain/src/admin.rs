//! Admin read models and actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::UserAnalytics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    pub is_verified: bool,
    pub is_revoked: bool,
    pub credits: i64,
    pub max_resume: i64,
    pub created_at: DateTime<Utc>,
    pub analytics: UserAnalytics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUsersResponse {
    pub users: Vec<AdminUser>,
    pub total: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub total_users: i64,
    pub total_ai_calls: i64,
    pub total_tokens_used: i64,
    pub total_pdfs_generated: i64,
    pub total_pdfs_downloaded: i64,
    pub active_users_last_30_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminStatsResponse {
    pub stats: PlatformStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiUsageStats {
    pub user_id: Uuid,
    pub user_email: String,
    pub total_calls: i64,
    pub total_tokens: i64,
    pub last_call_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminAiUsageResponse {
    pub usage: Vec<AiUsageStats>,
    pub total_calls: i64,
    pub total_tokens: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfStats {
    pub user_id: Uuid,
    pub user_email: String,
    pub pdfs_generated: i64,
    pub pdfs_downloaded: i64,
    pub last_generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminPdfStatsResponse {
    pub stats: Vec<PdfStats>,
    pub total_generated: i64,
    pub total_downloaded: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUserDetail {
    pub user: AdminUser,
    pub ai_usage: Vec<crate::ai::AiUsageEntry>,
    pub pdf_stats: PdfStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditsMode {
    /// Replace the balance.
    #[default]
    Set,
    /// Add a signed delta to the balance.
    Adjust,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCreditsRequest {
    pub credits: i64,
    #[serde(default)]
    pub mode: CreditsMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoteAdminRequest {
    pub email: String,
}

/// Outcome of a user-level admin action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminActionResponse {
    pub message: String,
    pub user_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_revoked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<i64>,
}

impl AdminActionResponse {
    pub fn new(message: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            message: message.into(),
            user_id,
            is_revoked: None,
            is_admin: None,
            credits: None,
        }
    }
}
