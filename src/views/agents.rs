use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::password;
use crate::auth::scope::LeadScope;
use crate::db;
use crate::error::AppError;
use crate::models::{AgentProfile, Role};
use crate::state::SharedState;
use crate::views::{display_name, field_error, FieldError, LeadRow};

#[derive(Template)]
#[template(path = "agents/list.html")]
#[allow(dead_code)]
struct AgentListTemplate {
    user_name: String,
    is_organizer: bool,
    agents: Vec<AgentRow>,
}

#[derive(Template)]
#[template(path = "agents/detail.html")]
#[allow(dead_code)]
struct AgentDetailTemplate {
    user_name: String,
    is_organizer: bool,
    agent: AgentRow,
    leads: Vec<LeadRow>,
}

#[derive(Template)]
#[template(path = "agents/create.html")]
#[allow(dead_code)]
struct AgentCreateTemplate {
    user_name: String,
    is_organizer: bool,
    errors: Vec<FieldError>,
    form: AgentForm,
}

#[derive(Template)]
#[template(path = "agents/update.html")]
#[allow(dead_code)]
struct AgentUpdateTemplate {
    user_name: String,
    is_organizer: bool,
    errors: Vec<FieldError>,
    agent_id: String,
    form: AgentForm,
}

#[derive(Template)]
#[template(path = "agents/delete.html")]
#[allow(dead_code)]
struct AgentDeleteTemplate {
    user_name: String,
    is_organizer: bool,
    agent_id: String,
    agent_name: String,
}

#[allow(dead_code)]
#[derive(Clone)]
struct AgentRow {
    id: String,
    name: String,
    email: String,
    created_at: String,
}

impl AgentRow {
    fn from_profile(agent: &AgentProfile) -> Self {
        AgentRow {
            id: agent.id.to_string(),
            name: agent.name.clone(),
            email: agent.email.clone(),
            created_at: agent.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct AgentForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

fn validate(form: &AgentForm) -> Result<(String, String), Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = form.name.trim();
    if name.is_empty() {
        errors.push(field_error("name", "Name is required."));
    }
    let email = form.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        errors.push(field_error("email", "A valid email is required."));
    }

    if errors.is_empty() {
        Ok((name.to_string(), email))
    } else {
        Err(errors)
    }
}

fn temp_password() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_organizer()?;

    let agents = db::agents::list(&state.pool, auth.organization_id)
        .await?
        .iter()
        .map(AgentRow::from_profile)
        .collect();

    let template = AgentListTemplate {
        user_name: display_name(&state.pool, &auth).await?,
        is_organizer: true,
        agents,
    };
    Ok(Html(template.render().unwrap_or_default()))
}

pub async fn detail(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_organizer()?;

    let agent = db::agents::find_scoped(&state.pool, id, auth.organization_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Agent not found".to_string()))?;

    let assigned = LeadScope::Assigned {
        organization: auth.organization_id,
        agent: agent.id,
    };
    let leads = db::leads::list(&state.pool, &assigned)
        .await?
        .iter()
        .map(LeadRow::from_summary)
        .collect();

    let template = AgentDetailTemplate {
        user_name: display_name(&state.pool, &auth).await?,
        is_organizer: true,
        agent: AgentRow::from_profile(&agent),
        leads,
    };
    Ok(Html(template.render().unwrap_or_default()))
}

pub async fn create_page(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_organizer()?;

    let template = AgentCreateTemplate {
        user_name: display_name(&state.pool, &auth).await?,
        is_organizer: true,
        errors: Vec::new(),
        form: AgentForm::default(),
    };
    Ok(Html(template.render().unwrap_or_default()))
}

/// Agent onboarding: user and agent row in one transaction, then an
/// invite with a temporary password.
pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Form(form): Form<AgentForm>,
) -> Result<Response, AppError> {
    auth.require_organizer()?;

    let (name, email) = match validate(&form) {
        Ok(values) => values,
        Err(errors) => {
            let template = AgentCreateTemplate {
                user_name: display_name(&state.pool, &auth).await?,
                is_organizer: true,
                errors,
                form,
            };
            return Ok(Html(template.render().unwrap_or_default()).into_response());
        }
    };

    let temp_pass = temp_password();
    let pw_hash = password::hash(&temp_pass).map_err(AppError::Internal)?;

    let mut tx = state.pool.begin().await?;

    let user = match db::users::create(&mut *tx, &email, &pw_hash, &name, Role::Agent).await {
        Ok(user) => user,
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
            let template = AgentCreateTemplate {
                user_name: display_name(&state.pool, &auth).await?,
                is_organizer: true,
                errors: vec![field_error("email", "That email is already registered.")],
                form,
            };
            return Ok(Html(template.render().unwrap_or_default()).into_response());
        }
        Err(e) => return Err(AppError::Database(e)),
    };

    db::agents::create(&mut *tx, user.id, auth.organization_id).await?;

    tx.commit().await?;

    if let Some(mailer) = state.mailer.clone() {
        let base_url = state.config.base_url.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer
                .send_agent_invite(&user.email, &user.name, &temp_pass, &base_url)
                .await
            {
                tracing::error!("Failed to send agent invite: {e}");
            }
        });
    }

    Ok(Redirect::to("/agents").into_response())
}

pub async fn update_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_organizer()?;

    let agent = db::agents::find_scoped(&state.pool, id, auth.organization_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Agent not found".to_string()))?;

    let template = AgentUpdateTemplate {
        user_name: display_name(&state.pool, &auth).await?,
        is_organizer: true,
        errors: Vec::new(),
        agent_id: agent.id.to_string(),
        form: AgentForm {
            name: agent.name,
            email: agent.email,
        },
    };
    Ok(Html(template.render().unwrap_or_default()))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Form(form): Form<AgentForm>,
) -> Result<Response, AppError> {
    auth.require_organizer()?;

    let agent = db::agents::find_scoped(&state.pool, id, auth.organization_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Agent not found".to_string()))?;

    let (name, email) = match validate(&form) {
        Ok(values) => values,
        Err(errors) => {
            let template = AgentUpdateTemplate {
                user_name: display_name(&state.pool, &auth).await?,
                is_organizer: true,
                errors,
                agent_id: agent.id.to_string(),
                form,
            };
            return Ok(Html(template.render().unwrap_or_default()).into_response());
        }
    };

    match db::users::update_contact(&state.pool, agent.user_id, &name, &email).await {
        Ok(_) => {}
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
            let template = AgentUpdateTemplate {
                user_name: display_name(&state.pool, &auth).await?,
                is_organizer: true,
                errors: vec![field_error("email", "That email is already registered.")],
                agent_id: agent.id.to_string(),
                form,
            };
            return Ok(Html(template.render().unwrap_or_default()).into_response());
        }
        Err(e) => return Err(AppError::Database(e)),
    }

    Ok(Redirect::to("/agents").into_response())
}

pub async fn delete_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_organizer()?;

    let agent = db::agents::find_scoped(&state.pool, id, auth.organization_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Agent not found".to_string()))?;

    let template = AgentDeleteTemplate {
        user_name: display_name(&state.pool, &auth).await?,
        is_organizer: true,
        agent_id: agent.id.to_string(),
        agent_name: agent.name,
    };
    Ok(Html(template.render().unwrap_or_default()))
}

/// Removes the agent's account. Leads the agent was working keep
/// existing and drop back to the unassigned pool.
pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Redirect, AppError> {
    auth.require_organizer()?;

    let agent = db::agents::find_scoped(&state.pool, id, auth.organization_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Agent not found".to_string()))?;

    db::users::delete(&state.pool, agent.user_id).await?;

    Ok(Redirect::to("/agents"))
}
