//! Plan Resolver — finds the plan that governs a user's request.
//!
//! Newest active, unexpired subscription wins; users without one fall back to the
//! configured default plan. Resolutions are cached in Redis when a client is configured.

use async_trait::async_trait;
use redis::AsyncCommands;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::plan::{Plan, PlanRow};

#[async_trait]
pub trait PlanResolver: Send + Sync {
    async fn resolve(&self, user_id: Uuid) -> Result<Plan, AppError>;
}

pub struct PgPlanResolver {
    pool: PgPool,
    redis: Option<redis::Client>,
    default_plan: String,
    cache_ttl_secs: u64,
}

impl PgPlanResolver {
    pub fn new(
        pool: PgPool,
        redis: Option<redis::Client>,
        default_plan: String,
        cache_ttl_secs: u64,
    ) -> Self {
        Self {
            pool,
            redis,
            default_plan,
            cache_ttl_secs,
        }
    }

    async fn load_from_db(&self, user_id: Uuid) -> Result<Plan, AppError> {
        let subscribed: Option<PlanRow> = sqlx::query_as(
            r#"
            SELECT p.*
            FROM user_subscriptions s
            JOIN plans p ON p.id = s.plan_id
            WHERE s.user_id = $1
              AND s.status = 'active'
              AND (s.expires_at IS NULL OR s.expires_at > now())
              AND p.is_active
            ORDER BY s.created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = match subscribed {
            Some(row) => row,
            None => {
                debug!(
                    "User {user_id} has no active subscription, using plan '{}'",
                    self.default_plan
                );
                sqlx::query_as::<_, PlanRow>(
                    "SELECT * FROM plans WHERE name = $1 AND is_active",
                )
                .bind(&self.default_plan)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| {
                    AppError::PlanConfiguration(format!(
                        "default plan '{}' does not exist or is inactive",
                        self.default_plan
                    ))
                })?
            }
        };

        Plan::try_from(row).map_err(|e| AppError::PlanConfiguration(e.to_string()))
    }

    async fn cached(&self, client: &redis::Client, key: &str) -> redis::RedisResult<Option<Plan>> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(key).await?;
        // A stale or foreign payload is treated as a miss.
        Ok(raw.and_then(|s| serde_json::from_str(&s).ok()))
    }

    async fn store(&self, client: &redis::Client, key: &str, plan: &Plan) -> anyhow::Result<()> {
        let payload = serde_json::to_string(plan)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(key, payload, self.cache_ttl_secs)
            .await?;
        Ok(())
    }
}

fn cache_key(user_id: Uuid) -> String {
    format!("plan:user:{user_id}")
}

#[async_trait]
impl PlanResolver for PgPlanResolver {
    async fn resolve(&self, user_id: Uuid) -> Result<Plan, AppError> {
        let Some(client) = &self.redis else {
            return self.load_from_db(user_id).await;
        };

        let key = cache_key(user_id);
        match self.cached(client, &key).await {
            Ok(Some(plan)) => return Ok(plan),
            Ok(None) => {}
            Err(e) => warn!("Plan cache read failed for user {user_id}: {e}"),
        }

        let plan = self.load_from_db(user_id).await?;
        if let Err(e) = self.store(client, &key, &plan).await {
            warn!("Plan cache write failed for user {user_id}: {e}");
        }
        Ok(plan)
    }
}
