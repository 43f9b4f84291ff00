use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Stored value meaning "no cap" for `max_free_templates`.
pub const UNLIMITED_SENTINEL: i64 = -1;

#[derive(Debug, Error, PartialEq)]
pub enum PlanConfigError {
    #[error("template limit {0} is invalid (expected -1 or a non-negative count)")]
    InvalidLimit(i64),

    #[error("plan '{plan}' has a malformed feature map: {reason}")]
    MalformedFeatures { plan: String, reason: String },
}

/// Cap on the number of distinct free templates a user may consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum TemplateLimit {
    Limited(u32),
    Unlimited,
}

impl TryFrom<i64> for TemplateLimit {
    type Error = PlanConfigError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        if raw == UNLIMITED_SENTINEL {
            return Ok(TemplateLimit::Unlimited);
        }
        u32::try_from(raw)
            .map(TemplateLimit::Limited)
            .map_err(|_| PlanConfigError::InvalidLimit(raw))
    }
}

impl From<TemplateLimit> for i64 {
    fn from(limit: TemplateLimit) -> Self {
        match limit {
            TemplateLimit::Limited(n) => i64::from(n),
            TemplateLimit::Unlimited => UNLIMITED_SENTINEL,
        }
    }
}

/// Typed feature map carried by every plan. All keys are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanFeatures {
    pub premium_templates_access: bool,
    pub max_free_templates: TemplateLimit,
    pub resume_create_unlimited: bool,
}

/// A subscription tier as resolved for one request. Immutable for the request's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub features: PlanFeatures,
}

impl Plan {
    /// Free tier: no premium template access.
    pub fn is_free_tier(&self) -> bool {
        !self.features.premium_templates_access
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlanRow {
    pub id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub is_active: bool,
    pub features: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PlanRow> for Plan {
    type Error = PlanConfigError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        let features: PlanFeatures =
            serde_json::from_value(row.features).map_err(|e| PlanConfigError::MalformedFeatures {
                plan: row.name.clone(),
                reason: e.to_string(),
            })?;
        Ok(Plan {
            id: row.id,
            name: row.name,
            is_active: row.is_active,
            features,
        })
    }
}
