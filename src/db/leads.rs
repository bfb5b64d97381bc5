use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::scope::LeadScope;
use crate::models::{Lead, LeadSummary};

const SUMMARY_SELECT: &str =
    "SELECT l.id, l.first_name, l.last_name, l.age, l.description, l.phone, l.email,
            u.name AS agent_name, c.name AS category_name, l.created_at
     FROM leads l
     LEFT JOIN agents a ON a.id = l.agent_id
     LEFT JOIN users u ON u.id = a.user_id
     LEFT JOIN categories c ON c.id = l.category_id";

/// Field set shared by create and update. The organization is never part
/// of it: it is bound separately from the requester's session.
#[derive(Debug)]
pub struct LeadInput<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub age: i32,
    pub description: &'a str,
    pub phone: &'a str,
    pub email: &'a str,
    pub agent_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

/// Scoped primary listing: leads with an agent assigned, narrowed to the
/// requester's own leads for agent sessions.
pub async fn list(pool: &PgPool, scope: &LeadScope) -> Result<Vec<LeadSummary>, sqlx::Error> {
    match scope {
        LeadScope::Organization(org) => {
            let sql = format!(
                "{SUMMARY_SELECT} WHERE l.organization_id = $1 AND l.agent_id IS NOT NULL
                 ORDER BY l.created_at DESC"
            );
            sqlx::query_as::<_, LeadSummary>(&sql)
                .bind(org)
                .fetch_all(pool)
                .await
        }
        LeadScope::Assigned {
            organization,
            agent,
        } => {
            let sql = format!(
                "{SUMMARY_SELECT} WHERE l.organization_id = $1 AND l.agent_id = $2
                 ORDER BY l.created_at DESC"
            );
            sqlx::query_as::<_, LeadSummary>(&sql)
                .bind(organization)
                .bind(agent)
                .fetch_all(pool)
                .await
        }
    }
}

/// Organizer sidebar: leads of the organization nobody is working yet.
pub async fn list_unassigned(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Vec<LeadSummary>, sqlx::Error> {
    let sql = format!(
        "{SUMMARY_SELECT} WHERE l.organization_id = $1 AND l.agent_id IS NULL
         ORDER BY l.created_at DESC"
    );
    sqlx::query_as::<_, LeadSummary>(&sql)
        .bind(organization_id)
        .fetch_all(pool)
        .await
}

pub async fn list_by_category(
    pool: &PgPool,
    category_id: Uuid,
    scope: &LeadScope,
) -> Result<Vec<LeadSummary>, sqlx::Error> {
    match scope {
        LeadScope::Organization(org) => {
            let sql = format!(
                "{SUMMARY_SELECT} WHERE l.category_id = $1 AND l.organization_id = $2
                 ORDER BY l.created_at DESC"
            );
            sqlx::query_as::<_, LeadSummary>(&sql)
                .bind(category_id)
                .bind(org)
                .fetch_all(pool)
                .await
        }
        LeadScope::Assigned {
            organization,
            agent,
        } => {
            let sql = format!(
                "{SUMMARY_SELECT} WHERE l.category_id = $1 AND l.organization_id = $2
                 AND l.agent_id = $3 ORDER BY l.created_at DESC"
            );
            sqlx::query_as::<_, LeadSummary>(&sql)
                .bind(category_id)
                .bind(organization)
                .bind(agent)
                .fetch_all(pool)
                .await
        }
    }
}

pub async fn find_scoped(
    pool: &PgPool,
    id: Uuid,
    scope: &LeadScope,
) -> Result<Option<Lead>, sqlx::Error> {
    match scope {
        LeadScope::Organization(org) => {
            sqlx::query_as::<_, Lead>(
                "SELECT * FROM leads WHERE id = $1 AND organization_id = $2",
            )
            .bind(id)
            .bind(org)
            .fetch_optional(pool)
            .await
        }
        LeadScope::Assigned {
            organization,
            agent,
        } => {
            sqlx::query_as::<_, Lead>(
                "SELECT * FROM leads WHERE id = $1 AND organization_id = $2 AND agent_id = $3",
            )
            .bind(id)
            .bind(organization)
            .bind(agent)
            .fetch_optional(pool)
            .await
        }
    }
}

pub async fn find_summary_scoped(
    pool: &PgPool,
    id: Uuid,
    scope: &LeadScope,
) -> Result<Option<LeadSummary>, sqlx::Error> {
    match scope {
        LeadScope::Organization(org) => {
            let sql = format!("{SUMMARY_SELECT} WHERE l.id = $1 AND l.organization_id = $2");
            sqlx::query_as::<_, LeadSummary>(&sql)
                .bind(id)
                .bind(org)
                .fetch_optional(pool)
                .await
        }
        LeadScope::Assigned {
            organization,
            agent,
        } => {
            let sql = format!(
                "{SUMMARY_SELECT} WHERE l.id = $1 AND l.organization_id = $2 AND l.agent_id = $3"
            );
            sqlx::query_as::<_, LeadSummary>(&sql)
                .bind(id)
                .bind(organization)
                .bind(agent)
                .fetch_optional(pool)
                .await
        }
    }
}

pub async fn create(
    pool: &PgPool,
    organization_id: Uuid,
    input: &LeadInput<'_>,
) -> Result<Lead, sqlx::Error> {
    sqlx::query_as::<_, Lead>(
        "INSERT INTO leads
            (organization_id, agent_id, category_id, first_name, last_name,
             age, description, phone, email)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
    )
    .bind(organization_id)
    .bind(input.agent_id)
    .bind(input.category_id)
    .bind(input.first_name)
    .bind(input.last_name)
    .bind(input.age)
    .bind(input.description)
    .bind(input.phone)
    .bind(input.email)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    organization_id: Uuid,
    input: &LeadInput<'_>,
) -> Result<Lead, sqlx::Error> {
    sqlx::query_as::<_, Lead>(
        "UPDATE leads
         SET agent_id = $3, category_id = $4, first_name = $5, last_name = $6,
             age = $7, description = $8, phone = $9, email = $10
         WHERE id = $1 AND organization_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(organization_id)
    .bind(input.agent_id)
    .bind(input.category_id)
    .bind(input.first_name)
    .bind(input.last_name)
    .bind(input.age)
    .bind(input.description)
    .bind(input.phone)
    .bind(input.email)
    .fetch_one(pool)
    .await
}

pub async fn assign_agent(
    pool: &PgPool,
    id: Uuid,
    organization_id: Uuid,
    agent_id: Uuid,
) -> Result<Lead, sqlx::Error> {
    sqlx::query_as::<_, Lead>(
        "UPDATE leads SET agent_id = $3 WHERE id = $1 AND organization_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(organization_id)
    .bind(agent_id)
    .fetch_one(pool)
    .await
}

/// Recategorize within scope. Agents can only move their own leads.
pub async fn set_category(
    pool: &PgPool,
    id: Uuid,
    scope: &LeadScope,
    category_id: Option<Uuid>,
) -> Result<Lead, sqlx::Error> {
    match scope {
        LeadScope::Organization(org) => {
            sqlx::query_as::<_, Lead>(
                "UPDATE leads SET category_id = $3
                 WHERE id = $1 AND organization_id = $2 RETURNING *",
            )
            .bind(id)
            .bind(org)
            .bind(category_id)
            .fetch_one(pool)
            .await
        }
        LeadScope::Assigned {
            organization,
            agent,
        } => {
            sqlx::query_as::<_, Lead>(
                "UPDATE leads SET category_id = $4
                 WHERE id = $1 AND organization_id = $2 AND agent_id = $3 RETURNING *",
            )
            .bind(id)
            .bind(organization)
            .bind(agent)
            .bind(category_id)
            .fetch_one(pool)
            .await
        }
    }
}

pub async fn delete(pool: &PgPool, id: Uuid, organization_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM leads WHERE id = $1 AND organization_id = $2")
        .bind(id)
        .bind(organization_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count_uncategorized(pool: &PgPool, scope: &LeadScope) -> Result<i64, sqlx::Error> {
    match scope {
        LeadScope::Organization(org) => {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM leads WHERE organization_id = $1 AND category_id IS NULL",
            )
            .bind(org)
            .fetch_one(pool)
            .await
        }
        LeadScope::Assigned {
            organization,
            agent,
        } => {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM leads
                 WHERE organization_id = $1 AND agent_id = $2 AND category_id IS NULL",
            )
            .bind(organization)
            .bind(agent)
            .fetch_one(pool)
            .await
        }
    }
}
