use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub agent_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub description: String,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Lead joined with the display names of its agent and category.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct LeadSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub description: String,
    pub phone: String,
    pub email: String,
    pub agent_name: Option<String>,
    pub category_name: Option<String>,
    pub created_at: DateTime<Utc>,
}
