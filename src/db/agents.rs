use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Agent, AgentProfile};

const AGENT_SELECT: &str =
    "SELECT a.id, a.user_id, a.organization_id, u.name, u.email, a.created_at
     FROM agents a JOIN users u ON u.id = a.user_id";

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    organization_id: Uuid,
) -> Result<Agent, sqlx::Error> {
    sqlx::query_as::<_, Agent>(
        "INSERT INTO agents (user_id, organization_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(user_id)
    .bind(organization_id)
    .fetch_one(executor)
    .await
}

pub async fn list(pool: &PgPool, organization_id: Uuid) -> Result<Vec<AgentProfile>, sqlx::Error> {
    let sql = format!("{AGENT_SELECT} WHERE a.organization_id = $1 ORDER BY u.name");
    sqlx::query_as::<_, AgentProfile>(&sql)
        .bind(organization_id)
        .fetch_all(pool)
        .await
}

pub async fn find_scoped(
    pool: &PgPool,
    id: Uuid,
    organization_id: Uuid,
) -> Result<Option<AgentProfile>, sqlx::Error> {
    let sql = format!("{AGENT_SELECT} WHERE a.id = $1 AND a.organization_id = $2");
    sqlx::query_as::<_, AgentProfile>(&sql)
        .bind(id)
        .bind(organization_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Agent>, sqlx::Error> {
    sqlx::query_as::<_, Agent>("SELECT * FROM agents WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}
