pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::entitlement::handlers as entitlement;
use crate::plans::handlers as plans;
use crate::resumes::handlers as resumes;
use crate::state::AppState;
use crate::templates::handlers as templates;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Catalogue
        .route("/api/v1/plans", get(plans::handle_list_plans))
        .route("/api/v1/templates", get(templates::handle_list_templates))
        .route("/api/v1/templates/:id", get(templates::handle_get_template))
        .route(
            "/api/v1/entitlements",
            get(entitlement::handle_get_entitlements),
        )
        // Resumes
        .route(
            "/api/v1/resumes",
            get(resumes::handle_list_resumes).post(resumes::handle_create_resume),
        )
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get_resume)
                .patch(resumes::handle_update_resume)
                .delete(resumes::handle_delete_resume),
        )
        .route(
            "/api/v1/resumes/:id/duplicate",
            post(resumes::handle_duplicate_resume),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{body::Body, http::Request, http::StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::entitlement::memory::InMemoryUsageLedger;
    use crate::plans::resolver::PgPlanResolver;

    fn test_state() -> AppState {
        // Lazy pool: no connection is opened unless a handler queries it.
        let db = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy("postgres://localhost/resume_portal_test")
            .unwrap();
        AppState {
            plans: Arc::new(PgPlanResolver::new(db.clone(), None, "Free".to_string(), 60)),
            ledger: Arc::new(InMemoryUsageLedger::new()),
            db,
        }
    }

    #[tokio::test]
    async fn test_health_route() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_resume_rejects_malformed_body() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/resumes")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"template_id": "not-a-uuid"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/api/v1/jobs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
