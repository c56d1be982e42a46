//! Welcome and fallback handlers.

use axum::Json;
use serde::Serialize;

use crate::error::ApiError;

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `GET /api/v1`
pub async fn welcome() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome!".to_string(),
    })
}

/// Fallback for every unmatched method and path.
pub async fn not_found() -> ApiError {
    ApiError::route_not_found()
}
