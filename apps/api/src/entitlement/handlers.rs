use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entitlement::evaluator::remaining_free_templates;
use crate::errors::AppError;
use crate::models::plan::PlanFeatures;
use crate::models::usage::UsageRecordRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct EntitlementSummary {
    pub plan_name: String,
    pub features: PlanFeatures,
    pub used_free_templates: u64,
    /// `None` when the plan does not cap free templates.
    pub remaining_free_templates: Option<u64>,
    pub granted_templates: Vec<UsageRecordRow>,
}

/// GET /api/v1/entitlements
pub async fn handle_get_entitlements(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<EntitlementSummary>, AppError> {
    let plan = state.plans.resolve(params.user_id).await?;
    let granted_templates = state
        .ledger
        .list_for_user(params.user_id)
        .await
        .map_err(AppError::Internal)?;
    let used = granted_templates.len() as u64;

    Ok(Json(EntitlementSummary {
        remaining_free_templates: remaining_free_templates(&plan, used),
        plan_name: plan.name,
        features: plan.features,
        used_free_templates: used,
        granted_templates,
    }))
}
