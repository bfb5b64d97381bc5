pub mod agents;
pub mod auth;
pub mod categories;
pub mod leads;

use axum::routing::{get, post};
use axum::Router;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::LeadSummary;
use crate::state::SharedState;

pub fn view_routes() -> Router<SharedState> {
    Router::new()
        // Public
        .route("/", get(auth::landing_page))
        .route("/auth/signup", get(auth::signup_page).post(auth::signup))
        .route("/auth/login", get(auth::login_page).post(auth::login))
        .route("/auth/logout", post(auth::logout))
        // Leads
        .route("/leads", get(leads::list))
        .route("/leads/create", get(leads::create_page).post(leads::create))
        .route("/leads/{id}", get(leads::detail))
        .route("/leads/{id}/update", get(leads::update_page).post(leads::update))
        .route("/leads/{id}/delete", get(leads::delete_page).post(leads::delete))
        .route(
            "/leads/{id}/assign-agent",
            get(leads::assign_agent_page).post(leads::assign_agent),
        )
        .route(
            "/leads/{id}/category",
            get(leads::category_page).post(leads::set_category),
        )
        // Categories (read-only)
        .route("/leads/categories", get(categories::list))
        .route("/leads/categories/{id}", get(categories::detail))
        // Agents (organizer-only)
        .route("/agents", get(agents::list))
        .route("/agents/create", get(agents::create_page).post(agents::create))
        .route("/agents/{id}", get(agents::detail))
        .route("/agents/{id}/update", get(agents::update_page).post(agents::update))
        .route("/agents/{id}/delete", get(agents::delete_page).post(agents::delete))
}

/// One validation problem on a submitted form, keyed by field name.
#[derive(Debug, Clone)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

pub(crate) fn field_error(field: &'static str, message: impl Into<String>) -> FieldError {
    FieldError {
        field,
        message: message.into(),
    }
}

/// One `<option>` of a pre-filtered select.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

impl SelectOption {
    pub(crate) fn new(id: Uuid, name: &str, selected: Option<Uuid>) -> Self {
        SelectOption {
            id: id.to_string(),
            name: name.to_string(),
            selected: selected == Some(id),
        }
    }
}

/// Display row shared by the lead tables on every screen.
#[derive(Debug, Clone)]
pub struct LeadRow {
    pub id: String,
    pub name: String,
    pub age: i32,
    pub phone: String,
    pub email: String,
    pub description: String,
    pub agent: String,
    pub category: String,
    pub created_at: String,
}

impl LeadRow {
    pub(crate) fn from_summary(lead: &LeadSummary) -> Self {
        LeadRow {
            id: lead.id.to_string(),
            name: format!("{} {}", lead.first_name, lead.last_name),
            age: lead.age,
            phone: lead.phone.clone(),
            email: lead.email.clone(),
            description: lead.description.clone(),
            agent: lead
                .agent_name
                .clone()
                .unwrap_or_else(|| "Unassigned".to_string()),
            category: lead
                .category_name
                .clone()
                .unwrap_or_else(|| "Uncategorized".to_string()),
            created_at: lead.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Name shown in the nav for the logged-in account.
pub(crate) async fn display_name(pool: &PgPool, auth: &AuthUser) -> Result<String, AppError> {
    Ok(db::users::find_by_id(pool, auth.user_id)
        .await?
        .map(|u| u.name)
        .unwrap_or_default())
}
