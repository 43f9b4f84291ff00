use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TemplateRow {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub is_premium: bool,
    pub is_active: bool,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
