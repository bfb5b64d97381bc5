use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::scope::LeadScope;
use crate::db;
use crate::error::AppError;
use crate::models::Role;
use crate::state::SharedState;
use crate::views::{display_name, LeadRow};

#[derive(Template)]
#[template(path = "categories/list.html")]
#[allow(dead_code)]
struct CategoryListTemplate {
    user_name: String,
    is_organizer: bool,
    categories: Vec<CategoryRow>,
    uncategorized_count: i64,
}

#[derive(Template)]
#[template(path = "categories/detail.html")]
#[allow(dead_code)]
struct CategoryDetailTemplate {
    user_name: String,
    is_organizer: bool,
    category_name: String,
    leads: Vec<LeadRow>,
}

#[allow(dead_code)]
struct CategoryRow {
    id: String,
    name: String,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let scope = LeadScope::for_user(&auth)?;

    let categories = db::categories::list(&state.pool, scope.organization_id())
        .await?
        .iter()
        .map(|c| CategoryRow {
            id: c.id.to_string(),
            name: c.name.clone(),
        })
        .collect();

    let uncategorized_count = db::leads::count_uncategorized(&state.pool, &scope).await?;

    let template = CategoryListTemplate {
        user_name: display_name(&state.pool, &auth).await?,
        is_organizer: auth.role == Role::Organizer,
        categories,
        uncategorized_count,
    };
    Ok(Html(template.render().unwrap_or_default()))
}

pub async fn detail(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = LeadScope::for_user(&auth)?;

    let category = db::categories::find_scoped(&state.pool, id, scope.organization_id())
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    let leads = db::leads::list_by_category(&state.pool, category.id, &scope)
        .await?
        .iter()
        .map(LeadRow::from_summary)
        .collect();

    let template = CategoryDetailTemplate {
        user_name: display_name(&state.pool, &auth).await?,
        is_organizer: auth.role == Role::Organizer,
        category_name: category.name,
        leads,
    };
    Ok(Html(template.render().unwrap_or_default()))
}
