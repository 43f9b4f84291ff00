use anyhow::Result;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::resume::{ResumeRow, ResumeStatus};

pub struct NewResume<'a> {
    pub user_id: Uuid,
    pub template_id: Uuid,
    pub title: &'a str,
    pub content: &'a Value,
    pub status: ResumeStatus,
    pub plan_type: &'a str,
}

/// Fields to overwrite; `None` keeps the stored value.
#[derive(Default)]
pub struct ResumeChanges<'a> {
    pub template_id: Option<Uuid>,
    pub title: Option<&'a str>,
    pub content: Option<&'a Value>,
    pub status: Option<ResumeStatus>,
    pub plan_type: Option<&'a str>,
}

pub async fn insert_resume(pool: &PgPool, resume: NewResume<'_>) -> Result<ResumeRow> {
    Ok(sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes (id, user_id, template_id, title, content, status, plan_type)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(resume.user_id)
    .bind(resume.template_id)
    .bind(resume.title)
    .bind(resume.content)
    .bind(resume.status.as_str())
    .bind(resume.plan_type)
    .fetch_one(pool)
    .await?)
}

pub async fn get_resume(pool: &PgPool, resume_id: Uuid, user_id: Uuid) -> Result<Option<ResumeRow>> {
    Ok(
        sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(resume_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn list_resumes(pool: &PgPool, user_id: Uuid) -> Result<Vec<ResumeRow>> {
    Ok(sqlx::query_as::<_, ResumeRow>(
        "SELECT * FROM resumes WHERE user_id = $1 ORDER BY updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

pub async fn update_resume(
    pool: &PgPool,
    resume_id: Uuid,
    user_id: Uuid,
    changes: ResumeChanges<'_>,
) -> Result<Option<ResumeRow>> {
    Ok(sqlx::query_as::<_, ResumeRow>(
        r#"
        UPDATE resumes SET
            template_id = COALESCE($3, template_id),
            title       = COALESCE($4, title),
            content     = COALESCE($5, content),
            status      = COALESCE($6, status),
            plan_type   = COALESCE($7, plan_type),
            updated_at  = now()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(resume_id)
    .bind(user_id)
    .bind(changes.template_id)
    .bind(changes.title)
    .bind(changes.content)
    .bind(changes.status.map(|s| s.as_str()))
    .bind(changes.plan_type)
    .fetch_optional(pool)
    .await?)
}

/// Number of the user's resumes in `finalized` status.
pub async fn count_finalized(pool: &PgPool, user_id: Uuid) -> Result<u64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM resumes WHERE user_id = $1 AND status = $2")
            .bind(user_id)
            .bind(ResumeStatus::Finalized.as_str())
            .fetch_one(pool)
            .await?;
    Ok(count.max(0) as u64)
}

/// Deletes a resume. Template grants in the usage ledger are kept.
pub async fn delete_resume(pool: &PgPool, resume_id: Uuid, user_id: Uuid) -> Result<bool> {
    let done = sqlx::query("DELETE FROM resumes WHERE id = $1 AND user_id = $2")
        .bind(resume_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(done.rows_affected() > 0)
}
