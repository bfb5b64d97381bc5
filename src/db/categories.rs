use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Category;

/// Pipeline stages every new organization starts with.
pub const DEFAULT_STAGES: [&str; 4] = ["New", "Contacted", "Converted", "Unconverted"];

pub async fn seed_defaults<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    organization_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO categories (organization_id, name)
         SELECT $1, unnest($2::text[])",
    )
    .bind(organization_id)
    .bind(DEFAULT_STAGES.map(String::from).to_vec())
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list(pool: &PgPool, organization_id: Uuid) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        "SELECT * FROM categories WHERE organization_id = $1 ORDER BY created_at",
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await
}

pub async fn find_scoped(
    pool: &PgPool,
    id: Uuid,
    organization_id: Uuid,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        "SELECT * FROM categories WHERE id = $1 AND organization_id = $2",
    )
    .bind(id)
    .bind(organization_id)
    .fetch_optional(pool)
    .await
}
