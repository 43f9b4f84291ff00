use tracing::info;
use uuid::Uuid;

use crate::entitlement::evaluator::{check_finalize_limit, evaluate, Grant};
use crate::entitlement::ledger::UsageLedger;
use crate::errors::AppError;
use crate::models::plan::Plan;
use crate::models::template::TemplateRow;
use crate::resumes::store::count_finalized;
use crate::state::AppState;

/// Runs every entitlement check for binding a resume to `template`.
///
/// `finalized_count` is `Some` only when the write moves a resume to `finalized`.
/// The finalized-resume cap is checked first because it writes nothing; the
/// template check may record a permanent grant and must only run once nothing
/// else can refuse the request.
pub async fn authorize_resume_write(
    ledger: &dyn UsageLedger,
    user_id: Uuid,
    plan: &Plan,
    template: &TemplateRow,
    finalized_count: Option<u64>,
) -> Result<Grant, AppError> {
    if let Some(finalized) = finalized_count {
        check_finalize_limit(plan, finalized).into_result()?;
    }
    let grant = evaluate(ledger, user_id, plan, template)
        .await?
        .into_result()?;
    info!(
        "User {user_id} cleared for template {} ({grant:?})",
        template.id
    );
    Ok(grant)
}

/// The user's finalized-resume count when `finalizing`, else `None`.
pub async fn finalized_count_if(
    state: &AppState,
    user_id: Uuid,
    finalizing: bool,
) -> Result<Option<u64>, AppError> {
    if !finalizing {
        return Ok(None);
    }
    let finalized = count_finalized(&state.db, user_id)
        .await
        .map_err(AppError::Internal)?;
    Ok(Some(finalized))
}
