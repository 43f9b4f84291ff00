use axum::{extract::State, Json};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::plan::{Plan, PlanFeatures, PlanRow};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PlanSummary {
    pub id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub features: PlanFeatures,
}

/// GET /api/v1/plans
///
/// Active plans, cheapest first. Plans whose feature map fails to parse are skipped.
pub async fn handle_list_plans(
    State(state): State<AppState>,
) -> Result<Json<Vec<PlanSummary>>, AppError> {
    let rows = sqlx::query_as::<_, PlanRow>(
        "SELECT * FROM plans WHERE is_active ORDER BY price_cents ASC, name ASC",
    )
    .fetch_all(&state.db)
    .await?;

    let plans = rows
        .into_iter()
        .filter_map(|row| {
            let price_cents = row.price_cents;
            match Plan::try_from(row) {
                Ok(plan) => Some(PlanSummary {
                    id: plan.id,
                    name: plan.name,
                    price_cents,
                    features: plan.features,
                }),
                Err(e) => {
                    warn!("Skipping plan in listing: {e}");
                    None
                }
            }
        })
        .collect();

    Ok(Json(plans))
}
