use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One granted (user, free template) pair in the usage ledger.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UsageRecordRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub template_id: Uuid,
    pub created_at: DateTime<Utc>,
}
