use chrono::{DateTime, Utc};
use resume_domain::billing::PaymentRecord;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_name: String,
    pub credits_added: i64,
    pub amount_paid: i64,
    pub payment_id: String,
    pub order_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentRow> for PaymentRecord {
    fn from(row: PaymentRow) -> Self {
        PaymentRecord {
            id: row.id,
            user_id: row.user_id,
            plan_name: row.plan_name,
            credits_added: row.credits_added,
            amount_paid: row.amount_paid,
            payment_id: row.payment_id,
            order_id: row.order_id,
            status: row.status,
            created_at: row.created_at,
        }
    }
}
