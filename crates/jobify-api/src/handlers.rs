//! Request handlers.

pub mod auth;
pub mod jobs;
pub mod root;
pub mod users;

pub use auth::*;
pub use jobs::*;
pub use root::*;
pub use users::*;

use crate::error::ApiError;

/// Message for requests missing a required field.
pub const MISSING_VALUES_MESSAGE: &str = "Please provide all values";

/// Take a required string field, rejecting absent or blank values.
pub(crate) fn required(value: Option<String>) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request(MISSING_VALUES_MESSAGE))
}

/// Reject the request if any of `values` is absent or blank.
pub(crate) fn ensure_present(values: &[&Option<String>]) -> Result<(), ApiError> {
    let missing = values
        .iter()
        .any(|v| v.as_deref().map_or(true, |s| s.trim().is_empty()));
    if missing {
        return Err(ApiError::bad_request(MISSING_VALUES_MESSAGE));
    }
    Ok(())
}
