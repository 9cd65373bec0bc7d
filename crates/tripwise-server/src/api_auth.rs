//! Registration, login and profile handlers.

use crate::api::{created, non_blank, ok, with_conn, ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::token::{hash_password, verify_password};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tripwise_plans::{
    create_user, get_user_by_email, get_user_credentials, update_user_profile, NewUser,
    ProfileUpdate, User,
};
use tripwise_types::{ApiResponse, UserRole};

const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A user together with a freshly issued token.
#[derive(Debug, Serialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: User,
}

/// Loose `local@domain.tld` shape check, no whitespace allowed.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

async fn hash_blocking(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| ApiError::InternalServerError(format!("task join error: {e}")))?
        .map_err(|e| ApiError::InternalServerError(format!("password hashing failed: {e}")))
}

/// Handler for `POST /api/auth/register`.
pub async fn register_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Session>>), ApiError> {
    let Json(payload) = payload?;
    let (Some(email), Some(password), Some(name)) = (
        non_blank(payload.email),
        payload.password.filter(|p| !p.is_empty()),
        non_blank(payload.name),
    ) else {
        return Err(ApiError::BadRequest(
            "email, password and name are required".to_string(),
        ));
    };
    let email = email.to_lowercase();

    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("invalid email format".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }

    let lookup = email.clone();
    if with_conn(&state, move |conn| Ok(get_user_by_email(conn, &lookup)?))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("email is already registered".to_string()));
    }

    let role = if state
        .auth
        .admin_emails
        .iter()
        .any(|admin| admin.eq_ignore_ascii_case(&email))
    {
        UserRole::Admin
    } else {
        UserRole::User
    };
    let password_hash = hash_blocking(password, state.auth.bcrypt_cost).await?;

    // The insert itself also reports Conflict if a concurrent registration won.
    let user = with_conn(&state, move |conn| {
        Ok(create_user(
            conn,
            &NewUser {
                email,
                password_hash,
                name,
                role,
            },
        )?)
    })
    .await?;

    let token = state
        .tokens
        .issue(&user.id)
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;
    tracing::info!(user_id = %user.id, role = %user.role, "user registered");

    created(Session { user, token }, "registration successful")
}

/// Handler for `POST /api/auth/login`.
pub async fn login_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Session> {
    let Json(payload) = payload?;
    let (Some(email), Some(password)) = (
        non_blank(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "email and password are required".to_string(),
        ));
    };
    let email = email.to_lowercase();
    let rejected = || ApiError::Unauthorized("incorrect email or password".to_string());

    let credentials = with_conn(&state, move |conn| Ok(get_user_credentials(conn, &email)?))
        .await?
        .ok_or_else(rejected)?;

    let hash = credentials.password_hash;
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::InternalServerError(format!("task join error: {e}")))?;
    if !matches {
        tracing::info!(user_id = %credentials.user.id, "login rejected");
        return Err(rejected());
    }

    let user = credentials.user;
    let token = state
        .tokens
        .issue(&user.id)
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    ok(Session { user, token }, "login successful")
}

/// Handler for `GET /api/auth/me`.
pub async fn me_handler(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<UserEnvelope> {
    ok(UserEnvelope { user }, "user fetched")
}

/// Handler for `PUT /api/auth/profile`.
pub async fn update_profile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<UserEnvelope> {
    let Json(update) = payload?;
    if update.is_empty() {
        return Err(ApiError::BadRequest("no fields to update".to_string()));
    }

    let user = with_conn(&state, move |conn| {
        Ok(update_user_profile(conn, &user.id, &update)?)
    })
    .await?;

    ok(UserEnvelope { user }, "profile updated")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("traveller@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.cn"));
        assert!(!is_valid_email("traveller@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@b@example.com"));
        assert!(!is_valid_email("trav eller@example.com"));
        assert!(!is_valid_email("traveller@.com"));
        assert!(!is_valid_email("traveller@example."));
    }
}
