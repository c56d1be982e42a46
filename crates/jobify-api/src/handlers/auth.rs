//! Registration and login.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use jobify_models::{NewUser, User};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{JsonBody, Repos};
use crate::handlers::{ensure_present, required};
use crate::metrics;
use crate::state::AppState;

/// Message for a failed login, whether the email or the password was wrong.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid Credentials";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 20, message = "Name must be between 3 and 20 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    #[validate(length(max = 20, message = "Last name must be at most 20 characters"))]
    pub last_name: Option<String>,
    #[validate(length(max = 20, message = "Location must be at most 20 characters"))]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Response for every endpoint that hands out a token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    pub location: String,
}

impl AuthResponse {
    pub fn new(user: User, token: String) -> Self {
        let location = user.location.clone();
        Self { user, token, location }
    }
}

/// `POST /api/v1/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Repos(repos): Repos,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    ensure_present(&[&request.name, &request.email, &request.password])?;
    request.validate()?;

    let name = required(request.name)?;
    let email = required(request.email)?;
    let password = required(request.password)?;

    let password_hash = state.passwords.hash(&password).await?;
    let new_user = NewUser::new(name, email, password_hash)
        .with_last_name(request.last_name)
        .with_location(request.location);

    let user = repos.users.create(new_user).await?;
    let token = state.tokens.issue(&user.id)?;

    info!(user_id = %user.id, "Registered user");
    Ok((StatusCode::CREATED, Json(AuthResponse::new(user, token))))
}

/// `POST /api/v1/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Repos(repos): Repos,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = required(request.email)?;
    let password = required(request.password)?;

    let Some(record) = repos.users.find_by_email(&email).await? else {
        metrics::record_auth_failure("unknown_email");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS_MESSAGE));
    };

    if !state.passwords.verify(&password, &record.password_hash).await? {
        metrics::record_auth_failure("wrong_password");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS_MESSAGE));
    }

    let token = state.tokens.issue(&record.user.id)?;
    info!(user_id = %record.user.id, "User logged in");
    Ok(Json(AuthResponse::new(record.user, token)))
}
