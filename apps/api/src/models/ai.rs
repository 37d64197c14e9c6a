use chrono::{DateTime, Utc};
use resume_domain::ai::AiUsageEntry;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct AiUsageLogRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action_type: String,
    pub section: String,
    pub item_id: Option<Uuid>,
    pub tokens_used: i64,
    pub created_at: DateTime<Utc>,
}

impl From<AiUsageLogRow> for AiUsageEntry {
    fn from(row: AiUsageLogRow) -> Self {
        AiUsageEntry {
            action_type: row.action_type,
            section: row.section,
            item_id: row.item_id,
            tokens_used: row.tokens_used,
            created_at: row.created_at,
        }
    }
}
