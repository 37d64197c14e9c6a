use chrono::{DateTime, Utc};
use resume_domain::{Element, Record};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One row of `resume_elements`; `data` is the payload of `kind`.
#[derive(Debug, Clone, FromRow)]
pub struct ElementRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ElementRow {
    pub fn into_record<T: Element>(self) -> Result<Record<T>, serde_json::Error> {
        Ok(Record {
            id: self.id,
            user_id: self.user_id,
            data: serde_json::from_value(self.data)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
