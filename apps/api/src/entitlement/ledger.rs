//! Usage Ledger — durable record of distinct (user, free template) grants.
//!
//! Append-only. The `(user_id, template_id)` unique constraint is the sole guard
//! against double-granting; a duplicate insert is a normal outcome, not an error.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::usage::UsageRecordRow;

/// Result of attempting to record a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The pair was already recorded, possibly by a concurrent request.
    AlreadyExists,
}

/// Storage seam for the usage ledger. Carried in `AppState` as `Arc<dyn UsageLedger>`.
#[async_trait]
pub trait UsageLedger: Send + Sync {
    async fn exists(&self, user_id: Uuid, template_id: Uuid) -> Result<bool>;

    async fn count_for_user(&self, user_id: Uuid) -> Result<u64>;

    async fn try_insert(&self, user_id: Uuid, template_id: Uuid) -> Result<InsertOutcome>;

    /// All grants for a user, oldest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<UsageRecordRow>>;
}

pub struct PgUsageLedger {
    pool: PgPool,
}

impl PgUsageLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageLedger for PgUsageLedger {
    async fn exists(&self, user_id: Uuid, template_id: Uuid) -> Result<bool> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM template_usages WHERE user_id = $1 AND template_id = $2)",
        )
        .bind(user_id)
        .bind(template_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn count_for_user(&self, user_id: Uuid) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM template_usages WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.max(0) as u64)
    }

    async fn try_insert(&self, user_id: Uuid, template_id: Uuid) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO template_usages (user_id, template_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, template_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(template_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() > 0 => Ok(InsertOutcome::Inserted),
            Ok(_) => Ok(InsertOutcome::AlreadyExists),
            // A unique violation outside ON CONFLICT still means the pair is recorded.
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                debug!("Usage insert for user {user_id} template {template_id} hit unique violation");
                Ok(InsertOutcome::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<UsageRecordRow>> {
        Ok(sqlx::query_as::<_, UsageRecordRow>(
            "SELECT * FROM template_usages WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
