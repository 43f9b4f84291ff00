//! Axum route handlers for the Resume API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{plan_type_for, ResumeRow, ResumeStatus};
use crate::resumes::service::{authorize_resume_write, finalized_count_if};
use crate::resumes::store::{
    delete_resume, get_resume, insert_resume, list_resumes, update_resume, NewResume,
    ResumeChanges,
};
use crate::state::AppState;
use crate::templates::store::get_active_template;

const DEFAULT_TITLE: &str = "Untitled Resume";
const MAX_TITLE_LEN: usize = 200;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateResumeRequest {
    pub user_id: Uuid,
    pub template_id: Uuid,
    pub title: Option<String>,
    pub content: Option<Value>,
    pub status: Option<ResumeStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateResumeRequest {
    pub user_id: Uuid,
    pub template_id: Option<Uuid>,
    pub title: Option<String>,
    pub content: Option<Value>,
    pub status: Option<ResumeStatus>,
}

#[derive(Debug, Deserialize)]
pub struct DuplicateResumeRequest {
    pub user_id: Uuid,
}

fn validate_title(title: Option<&str>) -> Result<Option<&str>, AppError> {
    match title.map(str::trim) {
        Some("") => Err(AppError::Validation("title cannot be empty".to_string())),
        Some(t) if t.chars().count() > MAX_TITLE_LEN => Err(AppError::Validation(format!(
            "title cannot exceed {MAX_TITLE_LEN} characters"
        ))),
        other => Ok(other),
    }
}

fn not_found(resume_id: Uuid) -> AppError {
    AppError::NotFound(format!("Resume {resume_id} not found"))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes
pub async fn handle_create_resume(
    State(state): State<AppState>,
    Json(request): Json<CreateResumeRequest>,
) -> Result<(StatusCode, Json<ResumeRow>), AppError> {
    let title = validate_title(request.title.as_deref())?.unwrap_or(DEFAULT_TITLE);
    let status = request.status.unwrap_or(ResumeStatus::Draft);

    let plan = state.plans.resolve(request.user_id).await?;
    let template = get_active_template(&state.db, request.template_id).await?;
    let finalized =
        finalized_count_if(&state, request.user_id, status == ResumeStatus::Finalized).await?;
    authorize_resume_write(
        state.ledger.as_ref(),
        request.user_id,
        &plan,
        &template,
        finalized,
    )
    .await?;

    let content = request.content.unwrap_or_else(|| Value::Object(Default::default()));
    let resume = insert_resume(
        &state.db,
        NewResume {
            user_id: request.user_id,
            template_id: template.id,
            title,
            content: &content,
            status,
            plan_type: plan_type_for(template.is_premium),
        },
    )
    .await
    .map_err(AppError::Internal)?;

    Ok((StatusCode::CREATED, Json(resume)))
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ResumeRow>>, AppError> {
    let resumes = list_resumes(&state.db, params.user_id)
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(resumes))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ResumeRow>, AppError> {
    get_resume(&state.db, resume_id, params.user_id)
        .await
        .map_err(AppError::Internal)?
        .map(Json)
        .ok_or_else(|| not_found(resume_id))
}

/// PATCH /api/v1/resumes/:id
///
/// The effective template is re-checked on every update, whether or not it changes.
/// Moving a draft to `finalized` also checks the finalized-resume cap.
pub async fn handle_update_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
    Json(request): Json<UpdateResumeRequest>,
) -> Result<Json<ResumeRow>, AppError> {
    let title = validate_title(request.title.as_deref())?;

    let existing = get_resume(&state.db, resume_id, request.user_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| not_found(resume_id))?;

    let plan = state.plans.resolve(request.user_id).await?;
    let template_id = request.template_id.unwrap_or(existing.template_id);
    let template = get_active_template(&state.db, template_id).await?;

    let finalizing = request.status == Some(ResumeStatus::Finalized) && !existing.is_finalized();
    let finalized = finalized_count_if(&state, request.user_id, finalizing).await?;
    authorize_resume_write(
        state.ledger.as_ref(),
        request.user_id,
        &plan,
        &template,
        finalized,
    )
    .await?;

    let template_changed = template.id != existing.template_id;
    let updated = update_resume(
        &state.db,
        resume_id,
        request.user_id,
        ResumeChanges {
            template_id: template_changed.then_some(template.id),
            title,
            content: request.content.as_ref(),
            status: request.status,
            plan_type: template_changed.then(|| plan_type_for(template.is_premium)),
        },
    )
    .await
    .map_err(AppError::Internal)?
    .ok_or_else(|| not_found(resume_id))?;

    Ok(Json(updated))
}

/// POST /api/v1/resumes/:id/duplicate
///
/// The copy keeps the original's template, so the entitlement check resolves
/// through the reuse path for templates the user already holds. Copies start as drafts.
pub async fn handle_duplicate_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
    Json(request): Json<DuplicateResumeRequest>,
) -> Result<(StatusCode, Json<ResumeRow>), AppError> {
    let original = get_resume(&state.db, resume_id, request.user_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| not_found(resume_id))?;

    let plan = state.plans.resolve(request.user_id).await?;
    let template = get_active_template(&state.db, original.template_id).await?;
    authorize_resume_write(state.ledger.as_ref(), request.user_id, &plan, &template, None).await?;

    let title = format!("{} (Copy)", original.title);
    let copy = insert_resume(
        &state.db,
        NewResume {
            user_id: request.user_id,
            template_id: template.id,
            title: &title,
            content: &original.content,
            status: ResumeStatus::Draft,
            plan_type: plan_type_for(template.is_premium),
        },
    )
    .await
    .map_err(AppError::Internal)?;

    Ok((StatusCode::CREATED, Json(copy)))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let deleted = delete_resume(&state.db, resume_id, params.user_id)
        .await
        .map_err(AppError::Internal)?;
    if !deleted {
        return Err(not_found(resume_id));
    }
    Ok(StatusCode::NO_CONTENT)
}
