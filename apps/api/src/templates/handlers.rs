use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entitlement::evaluator::remaining_free_templates;
use crate::errors::AppError;
use crate::models::plan::Plan;
use crate::models::template::TemplateRow;
use crate::state::AppState;
use crate::templates::store::{get_active_template, list_active_templates};

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// A template as seen from one user's plan.
#[derive(Debug, Serialize)]
pub struct TemplateCard {
    #[serde(flatten)]
    pub template: TemplateRow,
    /// Premium template on a plan without premium access.
    pub locked: bool,
    /// Already in the user's usage ledger; selecting it again costs nothing.
    pub in_use: bool,
}

#[derive(Debug, Serialize)]
pub struct TemplateGalleryResponse {
    pub plan_name: String,
    pub remaining_free_templates: Option<u64>,
    pub templates: Vec<TemplateCard>,
}

pub fn annotate_templates(
    templates: Vec<TemplateRow>,
    plan: &Plan,
    used: &HashSet<Uuid>,
) -> Vec<TemplateCard> {
    templates
        .into_iter()
        .map(|template| TemplateCard {
            locked: template.is_premium && !plan.features.premium_templates_access,
            in_use: used.contains(&template.id),
            template,
        })
        .collect()
}

/// GET /api/v1/templates
pub async fn handle_list_templates(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<TemplateGalleryResponse>, AppError> {
    let plan = state.plans.resolve(params.user_id).await?;
    let usage = state
        .ledger
        .list_for_user(params.user_id)
        .await
        .map_err(AppError::Internal)?;
    let used: HashSet<Uuid> = usage.iter().map(|r| r.template_id).collect();

    let templates = list_active_templates(&state.db)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(TemplateGalleryResponse {
        remaining_free_templates: remaining_free_templates(&plan, usage.len() as u64),
        templates: annotate_templates(templates, &plan, &used),
        plan_name: plan.name,
    }))
}

/// GET /api/v1/templates/:id
pub async fn handle_get_template(
    State(state): State<AppState>,
    Path(template_id): Path<Uuid>,
) -> Result<Json<TemplateRow>, AppError> {
    Ok(Json(get_active_template(&state.db, template_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plan::{PlanFeatures, TemplateLimit};
    use chrono::Utc;

    fn template(is_premium: bool) -> TemplateRow {
        TemplateRow {
            id: Uuid::new_v4(),
            name: "Modern".to_string(),
            category: Some("professional".to_string()),
            is_premium,
            is_active: true,
            thumbnail_url: None,
            created_at: Utc::now(),
        }
    }

    fn plan(premium: bool) -> Plan {
        Plan {
            id: Uuid::new_v4(),
            name: "Free".to_string(),
            is_active: true,
            features: PlanFeatures {
                premium_templates_access: premium,
                max_free_templates: TemplateLimit::Limited(2),
                resume_create_unlimited: false,
            },
        }
    }

    #[test]
    fn test_premium_templates_locked_on_free_plan() {
        let (free, premium) = (template(false), template(true));
        let used: HashSet<Uuid> = [free.id].into_iter().collect();

        let cards = annotate_templates(vec![free, premium], &plan(false), &used);
        assert!(!cards[0].locked && cards[0].in_use);
        assert!(cards[1].locked && !cards[1].in_use);
    }

    #[test]
    fn test_nothing_locked_on_premium_plan() {
        let cards = annotate_templates(vec![template(true)], &plan(true), &HashSet::new());
        assert!(!cards[0].locked);
    }

    #[test]
    fn test_card_flattens_template_fields() {
        let cards = annotate_templates(vec![template(true)], &plan(false), &HashSet::new());
        let value = serde_json::to_value(&cards[0]).unwrap();
        assert_eq!(value["name"], "Modern");
        assert_eq!(value["locked"], true);
    }
}
