use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::entitlement::evaluator::Denial;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// An entitlement rule refused the request. Not a fault; carries upgrade guidance.
    #[error("Entitlement denied: {}", .0.code)]
    Entitlement(Denial),

    /// The plan attached to the request is missing or its feature document is malformed.
    #[error("Plan configuration error: {0}")]
    PlanConfiguration(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Entitlement(denial) => denial.code.http_status(),
            AppError::PlanConfiguration(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let error = match &self {
            AppError::NotFound(msg) => json!({ "code": "NOT_FOUND", "message": msg }),
            AppError::Validation(msg) => json!({ "code": "VALIDATION_ERROR", "message": msg }),
            AppError::Entitlement(denial) => json!({
                "code": denial.code,
                "message": denial.message,
                "details": denial.details,
                "upgrade_hint": denial.upgrade_hint,
            }),
            AppError::PlanConfiguration(msg) => {
                tracing::error!("Plan configuration error: {msg}");
                json!({
                    "code": "PLAN_CONFIGURATION_ERROR",
                    "message": "Subscription plan is misconfigured",
                })
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                json!({
                    "code": "DATABASE_ERROR",
                    "message": "A database error occurred",
                })
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                json!({
                    "code": "INTERNAL_ERROR",
                    "message": "An internal server error occurred",
                })
            }
        };

        (status, Json(json!({ "error": error }))).into_response()
    }
}
