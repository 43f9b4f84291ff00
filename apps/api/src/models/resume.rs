use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeStatus {
    Draft,
    Finalized,
}

impl ResumeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResumeStatus::Draft => "draft",
            ResumeStatus::Finalized => "finalized",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "draft" => Some(ResumeStatus::Draft),
            "finalized" => Some(ResumeStatus::Finalized),
            _ => None,
        }
    }
}

/// Whether the resume's template was premium when the resume was created.
pub fn plan_type_for(is_premium: bool) -> &'static str {
    if is_premium {
        "premium"
    } else {
        "free"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub template_id: Uuid,
    pub title: String,
    pub content: Value,
    pub status: String,
    pub plan_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResumeRow {
    pub fn is_finalized(&self) -> bool {
        ResumeStatus::parse(&self.status) == Some(ResumeStatus::Finalized)
    }
}
