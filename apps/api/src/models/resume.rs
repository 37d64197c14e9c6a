use chrono::{DateTime, Utc};
use resume_domain::ElementSelection;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct CustomResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub selection: Json<ElementSelection>,
    pub thumbnail_url: Option<String>,
    pub pdf_url: Option<String>,
    pub latex_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
