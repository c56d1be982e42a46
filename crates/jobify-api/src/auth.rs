//! Bearer token issuing and verification.
//!
//! Tokens are HS256 JWTs carrying the user id. The `require_auth` middleware
//! guards the protected routers; handlers read the attached claim through the
//! [`AuthUser`] extractor.

use std::time::Duration;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

/// Why a credential was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    Missing,
    #[error("malformed token")]
    Malformed,
    #[error("token expired")]
    Expired,
    #[error("bad token signature")]
    BadSignature,
}

impl AuthError {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthError::Missing => "missing",
            AuthError::Malformed => "malformed",
            AuthError::Expired => "expired",
            AuthError::BadSignature => "bad_signature",
        }
    }
}

/// Decoded token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies tokens with the process-wide secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
        }
    }

    /// Issue a token for `user_id`, valid for the configured lifetime.
    pub fn issue(&self, user_id: &str) -> Result<String, ApiError> {
        let now = Utc::now().timestamp();
        let lifetime = i64::try_from(self.lifetime.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            user_id: user_id.to_string(),
            iat: now,
            exp: now.saturating_add(lifetime),
        };
        self.sign(&claims)
    }

    /// Sign arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> Result<String, ApiError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to sign token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::BadSignature,
            _ => AuthError::Malformed,
        })?;

        if data.claims.user_id.is_empty() {
            return Err(AuthError::Malformed);
        }
        Ok(data.claims)
    }

    /// Verify the `Authorization: Bearer <token>` header.
    pub fn verify_headers(&self, headers: &HeaderMap) -> Result<Claims, AuthError> {
        let value = headers.get(AUTHORIZATION).ok_or(AuthError::Missing)?;
        let value = value.to_str().map_err(|_| AuthError::Malformed)?;

        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Missing)?;

        self.verify(token)
    }
}

/// Gate for the protected routers.
///
/// On success the claim is attached to the request extensions. On failure the
/// request never reaches the router.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match state.tokens.verify_headers(request.headers()) {
        Ok(claims) => {
            debug!(user_id = %claims.user_id, "Credential verified");
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        Err(reason) => {
            warn!(path = %request.uri().path(), reason = reason.as_str(), "Rejected credential");
            metrics::record_auth_failure(reason.as_str());
            Err(ApiError::Auth(reason))
        }
    }
}

/// Authenticated user, read from the claim attached by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .map(|claims| AuthUser {
                user_id: claims.user_id.clone(),
            })
            .ok_or(ApiError::Auth(AuthError::Missing))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", Duration::from_secs(3600))
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service();
        let token = tokens.issue("64b7f0c2a1b2c3d4e5f60718").unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.user_id, "64b7f0c2a1b2c3d4e5f60718");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service();
        let now = Utc::now().timestamp();
        let token = tokens
            .sign(&Claims {
                user_id: "u1".into(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        assert_eq!(tokens.verify(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let other = TokenService::new("another-secret", Duration::from_secs(3600));
        let token = other.issue("u1").unwrap();
        assert_eq!(service().verify(&token), Err(AuthError::BadSignature));
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!(service().verify("not.a.jwt"), Err(AuthError::Malformed));
    }

    #[test]
    fn test_header_parsing() {
        let tokens = service();
        let mut headers = HeaderMap::new();
        assert_eq!(tokens.verify_headers(&headers), Err(AuthError::Missing));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(tokens.verify_headers(&headers), Err(AuthError::Missing));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(tokens.verify_headers(&headers), Err(AuthError::Missing));

        let token = tokens.issue("u1").unwrap();
        let value = HeaderValue::from_str(&format!("Bearer {}", token)).unwrap();
        headers.insert(AUTHORIZATION, value);
        assert_eq!(tokens.verify_headers(&headers).unwrap().user_id, "u1");
    }
}
