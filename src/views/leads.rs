use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::scope::LeadScope;
use crate::db;
use crate::db::leads::LeadInput;
use crate::error::AppError;
use crate::models::{Lead, Role};
use crate::state::SharedState;
use crate::views::{display_name, field_error, FieldError, LeadRow, SelectOption};

#[derive(Template)]
#[template(path = "leads/list.html")]
#[allow(dead_code)]
struct LeadListTemplate {
    user_name: String,
    is_organizer: bool,
    leads: Vec<LeadRow>,
    unassigned: Vec<LeadRow>,
}

#[derive(Template)]
#[template(path = "leads/detail.html")]
#[allow(dead_code)]
struct LeadDetailTemplate {
    user_name: String,
    is_organizer: bool,
    lead: LeadRow,
}

#[derive(Template)]
#[template(path = "leads/create.html")]
#[allow(dead_code)]
struct LeadCreateTemplate {
    user_name: String,
    is_organizer: bool,
    errors: Vec<FieldError>,
    form: LeadForm,
    agents: Vec<SelectOption>,
    categories: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "leads/update.html")]
#[allow(dead_code)]
struct LeadUpdateTemplate {
    user_name: String,
    is_organizer: bool,
    errors: Vec<FieldError>,
    lead_id: String,
    form: LeadForm,
    agents: Vec<SelectOption>,
    categories: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "leads/delete.html")]
#[allow(dead_code)]
struct LeadDeleteTemplate {
    user_name: String,
    is_organizer: bool,
    lead_id: String,
    lead_name: String,
}

#[derive(Template)]
#[template(path = "leads/assign_agent.html")]
#[allow(dead_code)]
struct AssignAgentTemplate {
    user_name: String,
    is_organizer: bool,
    errors: Vec<FieldError>,
    lead_id: String,
    lead_name: String,
    agents: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "leads/category_update.html")]
#[allow(dead_code)]
struct CategoryUpdateTemplate {
    user_name: String,
    is_organizer: bool,
    errors: Vec<FieldError>,
    lead_id: String,
    lead_name: String,
    categories: Vec<SelectOption>,
}

/// Raw form input. Everything is a string so invalid submissions can be
/// redisplayed exactly as typed.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LeadForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub category_id: String,
}

impl LeadForm {
    fn from_lead(lead: &Lead) -> Self {
        LeadForm {
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
            age: lead.age.to_string(),
            phone: lead.phone.clone(),
            email: lead.email.clone(),
            description: lead.description.clone(),
            agent_id: lead.agent_id.map(|id| id.to_string()).unwrap_or_default(),
            category_id: lead
                .category_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug)]
struct LeadValues {
    first_name: String,
    last_name: String,
    age: i32,
    phone: String,
    email: String,
    description: String,
    agent_id: Option<Uuid>,
    category_id: Option<Uuid>,
}

impl LeadValues {
    fn as_input(&self) -> LeadInput<'_> {
        LeadInput {
            first_name: &self.first_name,
            last_name: &self.last_name,
            age: self.age,
            description: &self.description,
            phone: &self.phone,
            email: &self.email,
            agent_id: self.agent_id,
            category_id: self.category_id,
        }
    }
}

fn validate(form: &LeadForm) -> Result<LeadValues, Vec<FieldError>> {
    let mut errors = Vec::new();

    let first_name = form.first_name.trim();
    if first_name.is_empty() {
        errors.push(field_error("first_name", "First name is required."));
    }
    let last_name = form.last_name.trim();
    if last_name.is_empty() {
        errors.push(field_error("last_name", "Last name is required."));
    }

    let age = if form.age.trim().is_empty() {
        0
    } else {
        match form.age.trim().parse::<i32>() {
            Ok(age) if age >= 0 => age,
            _ => {
                errors.push(field_error("age", "Age must be a non-negative number."));
                0
            }
        }
    };

    let phone = form.phone.trim();
    if phone.is_empty() {
        errors.push(field_error("phone", "Phone number is required."));
    }
    let email = form.email.trim();
    if email.is_empty() || !email.contains('@') {
        errors.push(field_error("email", "A valid email is required."));
    }

    let agent_id = parse_optional_id(&form.agent_id, "agent_id", &mut errors);
    let category_id = parse_optional_id(&form.category_id, "category_id", &mut errors);

    if errors.is_empty() {
        Ok(LeadValues {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            age,
            phone: phone.to_string(),
            email: email.to_string(),
            description: form.description.trim().to_string(),
            agent_id,
            category_id,
        })
    } else {
        Err(errors)
    }
}

fn parse_optional_id(raw: &str, field: &'static str, errors: &mut Vec<FieldError>) -> Option<Uuid> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<Uuid>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.push(field_error(field, "Invalid selection."));
            None
        }
    }
}

/// Verify that submitted agent/category choices belong to the requester's
/// organization. Forged out-of-organization ids are rejected outright.
async fn check_choices(
    state: &SharedState,
    organization_id: Uuid,
    values: &LeadValues,
) -> Result<(), AppError> {
    if let Some(agent_id) = values.agent_id {
        if db::agents::find_scoped(&state.pool, agent_id, organization_id)
            .await?
            .is_none()
        {
            return Err(AppError::BadRequest("Unknown agent".to_string()));
        }
    }
    if let Some(category_id) = values.category_id {
        if db::categories::find_scoped(&state.pool, category_id, organization_id)
            .await?
            .is_none()
        {
            return Err(AppError::BadRequest("Unknown category".to_string()));
        }
    }
    Ok(())
}

async fn agent_options(
    state: &SharedState,
    organization_id: Uuid,
    selected: Option<Uuid>,
) -> Result<Vec<SelectOption>, AppError> {
    let agents = db::agents::list(&state.pool, organization_id).await?;
    Ok(agents
        .iter()
        .map(|a| SelectOption::new(a.id, &a.name, selected))
        .collect())
}

async fn category_options(
    state: &SharedState,
    organization_id: Uuid,
    selected: Option<Uuid>,
) -> Result<Vec<SelectOption>, AppError> {
    let categories = db::categories::list(&state.pool, organization_id).await?;
    Ok(categories
        .iter()
        .map(|c| SelectOption::new(c.id, &c.name, selected))
        .collect())
}

fn selected_id(raw: &str) -> Option<Uuid> {
    raw.trim().parse::<Uuid>().ok()
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let scope = LeadScope::for_user(&auth)?;

    let leads = db::leads::list(&state.pool, &scope)
        .await?
        .iter()
        .map(LeadRow::from_summary)
        .collect();

    // Unassigned leads are an organizer-only sidebar.
    let unassigned = if auth.role == Role::Organizer {
        db::leads::list_unassigned(&state.pool, auth.organization_id)
            .await?
            .iter()
            .map(LeadRow::from_summary)
            .collect()
    } else {
        Vec::new()
    };

    let template = LeadListTemplate {
        user_name: display_name(&state.pool, &auth).await?,
        is_organizer: auth.role == Role::Organizer,
        leads,
        unassigned,
    };
    Ok(Html(template.render().unwrap_or_default()))
}

pub async fn detail(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = LeadScope::for_user(&auth)?;

    let lead = db::leads::find_summary_scoped(&state.pool, id, &scope)
        .await?
        .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;

    let template = LeadDetailTemplate {
        user_name: display_name(&state.pool, &auth).await?,
        is_organizer: auth.role == Role::Organizer,
        lead: LeadRow::from_summary(&lead),
    };
    Ok(Html(template.render().unwrap_or_default()))
}

pub async fn create_page(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_organizer()?;

    let template = LeadCreateTemplate {
        user_name: display_name(&state.pool, &auth).await?,
        is_organizer: true,
        errors: Vec::new(),
        form: LeadForm::default(),
        agents: agent_options(&state, auth.organization_id, None).await?,
        categories: category_options(&state, auth.organization_id, None).await?,
    };
    Ok(Html(template.render().unwrap_or_default()))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Form(form): Form<LeadForm>,
) -> Result<Response, AppError> {
    auth.require_organizer()?;

    let values = match validate(&form) {
        Ok(values) => values,
        Err(errors) => {
            let template = LeadCreateTemplate {
                user_name: display_name(&state.pool, &auth).await?,
                is_organizer: true,
                errors,
                agents: agent_options(&state, auth.organization_id, selected_id(&form.agent_id))
                    .await?,
                categories: category_options(
                    &state,
                    auth.organization_id,
                    selected_id(&form.category_id),
                )
                .await?,
                form,
            };
            return Ok(Html(template.render().unwrap_or_default()).into_response());
        }
    };

    check_choices(&state, auth.organization_id, &values).await?;

    // The organization is always the creator's own, never client input.
    db::leads::create(&state.pool, auth.organization_id, &values.as_input()).await?;

    notify_lead_created(&state, auth.organization_id);

    Ok(Redirect::to("/leads").into_response())
}

pub async fn update_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_organizer()?;

    let scope = LeadScope::Organization(auth.organization_id);
    let lead = db::leads::find_scoped(&state.pool, id, &scope)
        .await?
        .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;

    let template = LeadUpdateTemplate {
        user_name: display_name(&state.pool, &auth).await?,
        is_organizer: true,
        errors: Vec::new(),
        lead_id: lead.id.to_string(),
        agents: agent_options(&state, auth.organization_id, lead.agent_id).await?,
        categories: category_options(&state, auth.organization_id, lead.category_id).await?,
        form: LeadForm::from_lead(&lead),
    };
    Ok(Html(template.render().unwrap_or_default()))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Form(form): Form<LeadForm>,
) -> Result<Response, AppError> {
    auth.require_organizer()?;

    let values = match validate(&form) {
        Ok(values) => values,
        Err(errors) => {
            let template = LeadUpdateTemplate {
                user_name: display_name(&state.pool, &auth).await?,
                is_organizer: true,
                errors,
                lead_id: id.to_string(),
                agents: agent_options(&state, auth.organization_id, selected_id(&form.agent_id))
                    .await?,
                categories: category_options(
                    &state,
                    auth.organization_id,
                    selected_id(&form.category_id),
                )
                .await?,
                form,
            };
            return Ok(Html(template.render().unwrap_or_default()).into_response());
        }
    };

    check_choices(&state, auth.organization_id, &values).await?;

    db::leads::update(&state.pool, id, auth.organization_id, &values.as_input())
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Lead not found".to_string()),
            _ => AppError::Database(e),
        })?;

    Ok(Redirect::to("/leads").into_response())
}

pub async fn delete_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_organizer()?;

    let scope = LeadScope::Organization(auth.organization_id);
    let lead = db::leads::find_scoped(&state.pool, id, &scope)
        .await?
        .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;

    let template = LeadDeleteTemplate {
        user_name: display_name(&state.pool, &auth).await?,
        is_organizer: true,
        lead_id: lead.id.to_string(),
        lead_name: format!("{} {}", lead.first_name, lead.last_name),
    };
    Ok(Html(template.render().unwrap_or_default()))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Redirect, AppError> {
    auth.require_organizer()?;

    let scope = LeadScope::Organization(auth.organization_id);
    db::leads::find_scoped(&state.pool, id, &scope)
        .await?
        .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;

    db::leads::delete(&state.pool, id, auth.organization_id).await?;

    Ok(Redirect::to("/leads"))
}

pub async fn assign_agent_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_organizer()?;

    let scope = LeadScope::Organization(auth.organization_id);
    let lead = db::leads::find_scoped(&state.pool, id, &scope)
        .await?
        .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;

    let template = AssignAgentTemplate {
        user_name: display_name(&state.pool, &auth).await?,
        is_organizer: true,
        errors: Vec::new(),
        lead_id: lead.id.to_string(),
        lead_name: format!("{} {}", lead.first_name, lead.last_name),
        agents: agent_options(&state, auth.organization_id, lead.agent_id).await?,
    };
    Ok(Html(template.render().unwrap_or_default()))
}

#[derive(Deserialize)]
pub struct AssignAgentForm {
    #[serde(default)]
    pub agent_id: String,
}

pub async fn assign_agent(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Form(form): Form<AssignAgentForm>,
) -> Result<Response, AppError> {
    auth.require_organizer()?;

    let scope = LeadScope::Organization(auth.organization_id);
    let lead = db::leads::find_scoped(&state.pool, id, &scope)
        .await?
        .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;

    let Some(agent_id) = selected_id(&form.agent_id) else {
        let template = AssignAgentTemplate {
            user_name: display_name(&state.pool, &auth).await?,
            is_organizer: true,
            errors: vec![field_error("agent_id", "Choose an agent.")],
            lead_id: lead.id.to_string(),
            lead_name: format!("{} {}", lead.first_name, lead.last_name),
            agents: agent_options(&state, auth.organization_id, lead.agent_id).await?,
        };
        return Ok(Html(template.render().unwrap_or_default()).into_response());
    };

    // The choice list is pre-filtered to the organization; a forged id
    // from another organization is rejected.
    if db::agents::find_scoped(&state.pool, agent_id, auth.organization_id)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest("Unknown agent".to_string()));
    }

    db::leads::assign_agent(&state.pool, id, auth.organization_id, agent_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Lead not found".to_string()),
            _ => AppError::Database(e),
        })?;

    Ok(Redirect::to("/leads").into_response())
}

pub async fn category_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = LeadScope::for_user(&auth)?;

    let lead = db::leads::find_scoped(&state.pool, id, &scope)
        .await?
        .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;

    let template = CategoryUpdateTemplate {
        user_name: display_name(&state.pool, &auth).await?,
        is_organizer: auth.role == Role::Organizer,
        errors: Vec::new(),
        lead_id: lead.id.to_string(),
        lead_name: format!("{} {}", lead.first_name, lead.last_name),
        categories: category_options(&state, scope.organization_id(), lead.category_id).await?,
    };
    Ok(Html(template.render().unwrap_or_default()))
}

#[derive(Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub category_id: String,
}

/// Recategorization is open to the organizer and to the lead's assigned
/// agent; the scope covers both cases.
pub async fn set_category(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Form(form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    let scope = LeadScope::for_user(&auth)?;

    db::leads::find_scoped(&state.pool, id, &scope)
        .await?
        .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;

    let raw = form.category_id.trim();
    let category_id = if raw.is_empty() {
        None
    } else {
        let category_id = raw
            .parse::<Uuid>()
            .map_err(|_| AppError::BadRequest("Unknown category".to_string()))?;
        if db::categories::find_scoped(&state.pool, category_id, scope.organization_id())
            .await?
            .is_none()
        {
            return Err(AppError::BadRequest("Unknown category".to_string()));
        }
        Some(category_id)
    };

    db::leads::set_category(&state.pool, id, &scope, category_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Lead not found".to_string()),
            _ => AppError::Database(e),
        })?;

    Ok(Redirect::to(&format!("/leads/{id}")).into_response())
}

/// Fixed announcement to the organization owner; failures only logged.
fn notify_lead_created(state: &SharedState, organization_id: Uuid) {
    let Some(mailer) = state.mailer.clone() else {
        return;
    };
    let pool = state.pool.clone();
    let base_url = state.config.base_url.clone();

    tokio::spawn(async move {
        match db::profiles::owner_email(&pool, organization_id).await {
            Ok(Some(to)) => {
                if let Err(e) = mailer.send_lead_created(&to, &base_url).await {
                    tracing::error!("Failed to send lead notification: {e}");
                }
            }
            Ok(None) => {}
            Err(e) => tracing::error!("Failed to look up notification recipient: {e}"),
        }
    });
}
