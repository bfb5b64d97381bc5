use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::auth::extractor::SESSION_COOKIE;
use crate::auth::jwt::{encode_token, Claims};
use crate::auth::password;
use crate::db;
use crate::error::AppError;
use crate::models::Role;
use crate::state::SharedState;
use crate::views::{field_error, FieldError};

#[derive(Template)]
#[template(path = "landing.html")]
#[allow(dead_code)]
struct LandingTemplate {
    user_name: String,
    is_organizer: bool,
}

#[derive(Template)]
#[template(path = "auth/login.html")]
#[allow(dead_code)]
struct LoginTemplate {
    user_name: String,
    is_organizer: bool,
    errors: Vec<FieldError>,
    email: String,
}

#[derive(Template)]
#[template(path = "auth/signup.html")]
#[allow(dead_code)]
struct SignupTemplate {
    user_name: String,
    is_organizer: bool,
    errors: Vec<FieldError>,
    name: String,
    email: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

pub async fn landing_page() -> impl IntoResponse {
    let template = LandingTemplate {
        user_name: String::new(),
        is_organizer: false,
    };
    Html(template.render().unwrap_or_default())
}

pub async fn login_page() -> impl IntoResponse {
    login_form(String::new(), Vec::new())
}

fn login_form(email: String, errors: Vec<FieldError>) -> Response {
    let template = LoginTemplate {
        user_name: String::new(),
        is_organizer: false,
        errors,
        email,
    };
    Html(template.render().unwrap_or_default()).into_response()
}

pub async fn login(
    State(state): State<SharedState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim().to_lowercase();

    if let Err(retry_secs) = state.login_limiter.check(&email) {
        return Ok(login_form(
            email,
            vec![field_error(
                "email",
                format!("Too many login attempts. Try again in {retry_secs} seconds."),
            )],
        ));
    }

    let Some(user) = db::users::find_by_email(&state.pool, &email).await? else {
        state.login_limiter.record_failure(&email);
        return Ok(login_form(
            email,
            vec![field_error("email", "Invalid email or password.")],
        ));
    };

    let valid = password::verify(&form.password, &user.password_hash)
        .map_err(AppError::Internal)?;
    if !valid {
        state.login_limiter.record_failure(&email);
        return Ok(login_form(
            email,
            vec![field_error("email", "Invalid email or password.")],
        ));
    }

    let claims = match user.role {
        Role::Organizer => {
            let profile = db::profiles::find_by_user(&state.pool, user.id)
                .await?
                .ok_or_else(|| {
                    AppError::Internal(format!("No profile for organizer {}", user.id))
                })?;
            Claims::new(user.id, profile.id, user.role, None)
        }
        Role::Agent => {
            let agent = db::agents::find_by_user(&state.pool, user.id)
                .await?
                .ok_or_else(|| {
                    AppError::Internal(format!("No agent record for user {}", user.id))
                })?;
            Claims::new(user.id, agent.organization_id, user.role, Some(agent.id))
        }
    };

    let token = encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;
    let jar = CookieJar::new().add(session_cookie(token, state.config.secure_cookies()));

    Ok((jar, Redirect::to("/leads")).into_response())
}

pub async fn signup_page() -> impl IntoResponse {
    signup_form(String::new(), String::new(), Vec::new())
}

fn signup_form(name: String, email: String, errors: Vec<FieldError>) -> Response {
    let template = SignupTemplate {
        user_name: String::new(),
        is_organizer: false,
        errors,
        name,
        email,
    };
    Html(template.render().unwrap_or_default()).into_response()
}

/// Organizer onboarding: user, profile, and the default pipeline stages
/// are created in one transaction.
pub async fn signup(
    State(state): State<SharedState>,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    let name = form.name.trim().to_string();
    let email = form.email.trim().to_lowercase();

    let mut errors = Vec::new();
    if name.is_empty() {
        errors.push(field_error("name", "Name is required."));
    }
    if email.is_empty() || !email.contains('@') {
        errors.push(field_error("email", "A valid email is required."));
    }
    if form.password.len() < 8 {
        errors.push(field_error(
            "password",
            "Password must be at least 8 characters.",
        ));
    }
    if form.password != form.confirm_password {
        errors.push(field_error("confirm_password", "Passwords do not match."));
    }
    if !errors.is_empty() {
        return Ok(signup_form(name, email, errors));
    }

    let pw_hash = password::hash(&form.password).map_err(AppError::Internal)?;

    let mut tx = state.pool.begin().await?;

    let user = match db::users::create(&mut *tx, &email, &pw_hash, &name, Role::Organizer).await {
        Ok(user) => user,
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
            return Ok(signup_form(
                name,
                email,
                vec![field_error("email", "That email is already registered.")],
            ));
        }
        Err(e) => return Err(AppError::Database(e)),
    };

    let profile = db::profiles::create(&mut *tx, user.id).await?;
    db::categories::seed_defaults(&mut *tx, profile.id).await?;

    tx.commit().await?;

    if let Some(mailer) = state.mailer.clone() {
        let base_url = state.config.base_url.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_welcome(&user.email, &user.name, &base_url).await {
                tracing::error!("Failed to send welcome email: {e}");
            }
        });
    }

    Ok(Redirect::to("/auth/login").into_response())
}

pub async fn logout() -> (CookieJar, Redirect) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    (CookieJar::new().add(cookie), Redirect::to("/auth/login"))
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(12))
        .build()
}
