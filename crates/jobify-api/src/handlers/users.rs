//! Current user profile.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use jobify_models::{ProfileUpdate, User};

use crate::auth::{AuthError, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{JsonBody, Repos};
use crate::handlers::{ensure_present, required, AuthResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub user: User,
    pub location: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 20, message = "Name must be between 3 and 20 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    #[validate(length(max = 20, message = "Last name must be at most 20 characters"))]
    pub last_name: Option<String>,
    #[validate(length(max = 20, message = "Location must be at most 20 characters"))]
    pub location: Option<String>,
}

/// A valid token for an account that no longer exists.
fn account_gone() -> ApiError {
    ApiError::Auth(AuthError::Missing)
}

/// `GET /api/v1/users/me`
pub async fn current_user(Repos(repos): Repos, user: AuthUser) -> ApiResult<Json<CurrentUserResponse>> {
    let user = repos.users.find_by_id(&user.user_id).await?.ok_or_else(account_gone)?;
    let location = user.location.clone();
    Ok(Json(CurrentUserResponse { user, location }))
}

/// `PATCH /api/v1/users/me`
///
/// Replaces the whole profile and issues a fresh token.
pub async fn update_user(
    State(state): State<AppState>,
    Repos(repos): Repos,
    user: AuthUser,
    JsonBody(request): JsonBody<UpdateUserRequest>,
) -> ApiResult<Json<AuthResponse>> {
    ensure_present(&[&request.name, &request.email, &request.last_name, &request.location])?;
    request.validate()?;

    let update = ProfileUpdate {
        name: required(request.name)?,
        email: required(request.email)?,
        last_name: required(request.last_name)?,
        location: required(request.location)?,
    };

    let updated = repos
        .users
        .update_profile(&user.user_id, &update)
        .await?
        .ok_or_else(account_gone)?;
    let token = state.tokens.issue(&updated.id)?;

    info!(user_id = %updated.id, "Updated user profile");
    Ok(Json(AuthResponse::new(updated, token)))
}
