mod config;
mod db;
mod entitlement;
mod errors;
mod models;
mod plans;
mod resumes;
mod routes;
mod state;
mod templates;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::entitlement::ledger::PgUsageLedger;
use crate::plans::resolver::PgPlanResolver;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume portal API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&db).await?;

    // Initialize Redis plan cache (optional)
    let redis = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!(
                "Redis plan cache enabled (ttl {}s)",
                config.plan_cache_ttl_secs
            );
            Some(client)
        }
        None => {
            info!("REDIS_URL not set, plan cache disabled");
            None
        }
    };

    let plans = Arc::new(PgPlanResolver::new(
        db.clone(),
        redis,
        config.default_plan.clone(),
        config.plan_cache_ttl_secs,
    ));
    info!("Default plan: '{}'", config.default_plan);

    // Build app state
    let state = AppState {
        ledger: Arc::new(PgUsageLedger::new(db.clone())),
        plans,
        db,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
