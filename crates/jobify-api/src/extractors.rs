//! Request extractors that reject with [`ApiError`].

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use jobify_store::Repositories;

use crate::error::ApiError;

/// JSON body whose rejections go through the error envelope.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(match rejection {
                JsonRejection::JsonDataError(e) => ApiError::Validation(e.body_text()),
                JsonRejection::JsonSyntaxError(_) => ApiError::Parse("Malformed JSON in request body".to_string()),
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::bad_request("Expected request with `Content-Type: application/json`")
                }
                other => ApiError::bad_request(other.body_text()),
            }),
        }
    }
}

/// Query string parameters.
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| QueryParams(value))
            .map_err(|rejection: QueryRejection| ApiError::bad_request(rejection.body_text()))
    }
}

/// Repositories bound to the live connection, attached by `ensure_database`.
#[derive(Clone)]
pub struct Repos(pub Repositories);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Repos
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Repositories>()
            .cloned()
            .map(Repos)
            .ok_or_else(|| ApiError::Connection("No database connection attached to request".to_string()))
    }
}
