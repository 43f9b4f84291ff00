//! Entitlement Evaluator — decides whether a user may build on a template.
//!
//! Rules, in order:
//! 1. The plan must be active; anything else is a configuration error.
//! 2. Premium templates require `premium_templates_access`.
//! 3. Free-tier plans without `resume_create_unlimited` may use at most
//!    `max_free_templates` distinct free templates. Re-selecting a template already
//!    in the ledger is always allowed and never re-counted.
//!
//! Denials are returned as values. Only configuration and storage failures are errors.
//!
//! The count check and the ledger insert are not wrapped in a transaction. Two
//! racing requests for different new templates can both pass the count check and
//! overshoot the cap by one; the ledger's unique pair still guarantees no
//! duplicate rows and no lost grants.

use std::fmt;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::entitlement::ledger::{InsertOutcome, UsageLedger};
use crate::errors::AppError;
use crate::models::plan::{Plan, TemplateLimit};
use crate::models::template::TemplateRow;

const PREMIUM_UPGRADE_HINT: &str = "Upgrade to a plan with premium template access to use this template.";
const TEMPLATE_LIMIT_UPGRADE_HINT: &str =
    "Upgrade your plan to use more templates, or pick one you have already used.";
const RESUME_LIMIT_UPGRADE_HINT: &str =
    "Upgrade your plan to finalize more resumes, or move an existing one back to draft.";

// ────────────────────────────────────────────────────────────────────────────
// Decision types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialCode {
    PremiumTemplateLocked,
    FreeTemplateLimitReached,
    PlanResumeLimitReached,
}

impl DenialCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialCode::PremiumTemplateLocked => "PREMIUM_TEMPLATE_LOCKED",
            DenialCode::FreeTemplateLimitReached => "FREE_TEMPLATE_LIMIT_REACHED",
            DenialCode::PlanResumeLimitReached => "PLAN_RESUME_LIMIT_REACHED",
        }
    }

    /// Status the HTTP layer should answer with. All denials are 403.
    pub fn http_status(&self) -> StatusCode {
        StatusCode::FORBIDDEN
    }
}

impl fmt::Display for DenialCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DenialDetails {
    PremiumLocked {
        template_id: Uuid,
        template_name: String,
        plan_name: String,
    },
    Limit {
        limit: u32,
        used: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Denial {
    pub code: DenialCode,
    pub message: String,
    pub upgrade_hint: String,
    pub details: DenialDetails,
}

/// Which path let the request through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    /// Plan is not subject to the free-template cap.
    Unrestricted,
    /// Template already in the ledger.
    Reused,
    /// New ledger record written by this request.
    Granted,
    /// Another request recorded the same pair first.
    GrantedConcurrently,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Allowed(Grant),
    Denied(Denial),
}

impl Decision {
    #[cfg(test)]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed(_))
    }

    /// Lifts a denial into the HTTP error type.
    pub fn into_result(self) -> Result<Grant, AppError> {
        match self {
            Decision::Allowed(grant) => Ok(grant),
            Decision::Denied(denial) => Err(AppError::Entitlement(denial)),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Template entitlement
// ────────────────────────────────────────────────────────────────────────────

/// Evaluates whether `user_id` may use `template` under `plan`, recording a new
/// free-template grant in the ledger when one is made.
pub async fn evaluate(
    ledger: &dyn UsageLedger,
    user_id: Uuid,
    plan: &Plan,
    template: &TemplateRow,
) -> Result<Decision, AppError> {
    if !plan.is_active {
        return Err(AppError::PlanConfiguration(format!(
            "plan '{}' resolved for user {user_id} is inactive",
            plan.name
        )));
    }

    let features = &plan.features;

    if template.is_premium && !features.premium_templates_access {
        info!(
            "Denied premium template {} to user {user_id} on plan '{}'",
            template.id, plan.name
        );
        return Ok(Decision::Denied(Denial {
            code: DenialCode::PremiumTemplateLocked,
            message: format!(
                "'{}' is a premium template and is not included in the {} plan",
                template.name, plan.name
            ),
            upgrade_hint: PREMIUM_UPGRADE_HINT.to_string(),
            details: DenialDetails::PremiumLocked {
                template_id: template.id,
                template_name: template.name.clone(),
                plan_name: plan.name.clone(),
            },
        }));
    }

    if template.is_premium || !plan.is_free_tier() || features.resume_create_unlimited {
        return Ok(Decision::Allowed(Grant::Unrestricted));
    }

    if ledger.exists(user_id, template.id).await.map_err(AppError::Internal)? {
        debug!("User {user_id} reusing template {}", template.id);
        return Ok(Decision::Allowed(Grant::Reused));
    }

    // Unlimited free tiers still record grants so usage stays auditable.
    if let TemplateLimit::Limited(limit) = features.max_free_templates {
        let used = ledger.count_for_user(user_id).await.map_err(AppError::Internal)?;
        if used >= u64::from(limit) {
            info!(
                "Denied template {} to user {user_id}: free template limit {limit} reached ({used} used)",
                template.id
            );
            return Ok(Decision::Denied(Denial {
                code: DenialCode::FreeTemplateLimitReached,
                message: format!(
                    "The {} plan allows {limit} free template(s) and all have been used",
                    plan.name
                ),
                upgrade_hint: TEMPLATE_LIMIT_UPGRADE_HINT.to_string(),
                details: DenialDetails::Limit { limit, used },
            }));
        }
    }

    match ledger
        .try_insert(user_id, template.id)
        .await
        .map_err(AppError::Internal)?
    {
        InsertOutcome::Inserted => {
            info!("Granted template {} to user {user_id}", template.id);
            Ok(Decision::Allowed(Grant::Granted))
        }
        InsertOutcome::AlreadyExists => {
            debug!(
                "Template {} already granted to user {user_id} by a concurrent request",
                template.id
            );
            Ok(Decision::Allowed(Grant::GrantedConcurrently))
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Finalized resume limit
// ────────────────────────────────────────────────────────────────────────────

/// Checks whether one more resume may move to `finalized`, given how many the
/// user already has. Draft resumes never count here.
pub fn check_finalize_limit(plan: &Plan, finalized_count: u64) -> Decision {
    if plan.features.resume_create_unlimited {
        return Decision::Allowed(Grant::Unrestricted);
    }
    let limit = match plan.features.max_free_templates {
        TemplateLimit::Unlimited => return Decision::Allowed(Grant::Unrestricted),
        TemplateLimit::Limited(limit) => limit,
    };
    if finalized_count < u64::from(limit) {
        return Decision::Allowed(Grant::Unrestricted);
    }
    Decision::Denied(Denial {
        code: DenialCode::PlanResumeLimitReached,
        message: format!(
            "The {} plan allows {limit} finalized resume(s) and all are in use",
            plan.name
        ),
        upgrade_hint: RESUME_LIMIT_UPGRADE_HINT.to_string(),
        details: DenialDetails::Limit {
            limit,
            used: finalized_count,
        },
    })
}

/// Free templates the user can still pick up. `None` when the plan is not capped.
pub fn remaining_free_templates(plan: &Plan, used: u64) -> Option<u64> {
    if !plan.is_free_tier() || plan.features.resume_create_unlimited {
        return None;
    }
    match plan.features.max_free_templates {
        TemplateLimit::Unlimited => None,
        TemplateLimit::Limited(limit) => Some(u64::from(limit).saturating_sub(used)),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
