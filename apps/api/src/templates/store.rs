use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::template::TemplateRow;

/// Active templates, free ones first.
pub async fn list_active_templates(pool: &PgPool) -> Result<Vec<TemplateRow>> {
    Ok(sqlx::query_as::<_, TemplateRow>(
        "SELECT * FROM templates WHERE is_active ORDER BY is_premium ASC, name ASC",
    )
    .fetch_all(pool)
    .await?)
}

/// Loads a template that can be built on. Missing and inactive templates are both 404.
pub async fn get_active_template(pool: &PgPool, template_id: Uuid) -> Result<TemplateRow, AppError> {
    sqlx::query_as::<_, TemplateRow>("SELECT * FROM templates WHERE id = $1 AND is_active")
        .bind(template_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Template {template_id} not found")))
}
