use std::sync::Arc;

use sqlx::PgPool;

use crate::entitlement::ledger::UsageLedger;
use crate::plans::resolver::PlanResolver;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Usage ledger. Default: PgUsageLedger over `template_usages`.
    pub ledger: Arc<dyn UsageLedger>,
    /// Plan resolution, Redis-cached when REDIS_URL is set.
    pub plans: Arc<dyn PlanResolver>,
}
