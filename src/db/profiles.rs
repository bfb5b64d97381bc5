use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Profile;

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
) -> Result<Profile, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        "INSERT INTO profiles (user_id) VALUES ($1) RETURNING *",
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
}

pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Email address of the account owning the organization.
pub async fn owner_email(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT u.email FROM profiles p JOIN users u ON u.id = p.user_id WHERE p.id = $1",
    )
    .bind(organization_id)
    .fetch_optional(pool)
    .await
}
