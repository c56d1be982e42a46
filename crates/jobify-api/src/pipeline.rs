//! Security pipeline applied to every request before routing.
//!
//! The request is buffered into a [`RequestContext`], passed through an
//! ordered list of [`Stage`]s and rebuilt before it reaches the router. Stages
//! may also record headers that are set on the final response.

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::http::uri::PathAndQuery;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::error::{ApiError, ApiResult};
use crate::security::{clean_text, clean_value, is_operator_query_key, strip_operators};
use crate::state::AppState;

/// Per-request view the stages operate on.
#[derive(Debug)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub raw_body: Bytes,
    /// Parsed JSON body, set by the body parser.
    pub body: Option<Value>,
    /// Headers to set on the outgoing response.
    pub response_headers: HeaderMap,
    original_query: Vec<(String, String)>,
}

impl RequestContext {
    pub fn new(method: Method, uri: &Uri, headers: HeaderMap, raw_body: Bytes) -> Self {
        let query: Vec<(String, String)> = uri
            .query()
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Self {
            method,
            path: uri.path().to_string(),
            headers,
            original_query: query.clone(),
            query,
            raw_body,
            body: None,
            response_headers: HeaderMap::new(),
        }
    }

    pub fn is_json(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|mime| {
                let mime = mime.trim().to_ascii_lowercase();
                mime == "application/json" || mime.ends_with("+json")
            })
            .unwrap_or(false)
    }

    pub fn query_changed(&self) -> bool {
        self.query != self.original_query
    }

    /// Encode the current query pairs.
    pub fn encoded_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish()
    }

    /// Body bytes to forward: the re-serialized JSON if parsed, else the raw bytes.
    fn body_bytes(&self) -> ApiResult<Bytes> {
        match &self.body {
            Some(value) => serde_json::to_vec(value)
                .map(Bytes::from)
                .map_err(|e| ApiError::internal(format!("Failed to re-encode body: {}", e))),
            None => Ok(self.raw_body.clone()),
        }
    }
}

/// One transformation step.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, ctx: &mut RequestContext) -> ApiResult<()>;
}

/// Parses JSON payloads. Malformed JSON is a 400.
pub struct BodyParser;

impl Stage for BodyParser {
    fn name(&self) -> &'static str {
        "body_parser"
    }

    fn apply(&self, ctx: &mut RequestContext) -> ApiResult<()> {
        if ctx.raw_body.is_empty() || !ctx.is_json() {
            return Ok(());
        }

        let value = serde_json::from_slice::<Value>(&ctx.raw_body).map_err(|e| {
            debug!(error = %e, "Rejected malformed JSON body");
            ApiError::Parse("Malformed JSON in request body".to_string())
        })?;
        ctx.body = Some(value);
        Ok(())
    }
}

/// Records hardening headers for the response.
pub struct ProtectiveHeaders;

impl ProtectiveHeaders {
    const HEADERS: [(&'static str, &'static str); 12] = [
        ("content-security-policy", "default-src 'self'; frame-ancestors 'none'; object-src 'none'"),
        ("cross-origin-opener-policy", "same-origin"),
        ("cross-origin-resource-policy", "same-origin"),
        ("origin-agent-cluster", "?1"),
        ("referrer-policy", "no-referrer"),
        ("strict-transport-security", "max-age=31536000; includeSubDomains"),
        ("x-content-type-options", "nosniff"),
        ("x-dns-prefetch-control", "off"),
        ("x-download-options", "noopen"),
        ("x-frame-options", "DENY"),
        ("x-permitted-cross-domain-policies", "none"),
        ("x-xss-protection", "0"),
    ];

    /// Set every hardening header on `headers`.
    pub fn insert_into(headers: &mut HeaderMap) {
        for (name, value) in Self::HEADERS {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }
    }
}

impl Stage for ProtectiveHeaders {
    fn name(&self) -> &'static str {
        "protective_headers"
    }

    fn apply(&self, ctx: &mut RequestContext) -> ApiResult<()> {
        Self::insert_into(&mut ctx.response_headers);
        Ok(())
    }
}

/// Cleans markup out of body and query strings.
pub struct XssSanitizer;

impl Stage for XssSanitizer {
    fn name(&self) -> &'static str {
        "xss_sanitizer"
    }

    fn apply(&self, ctx: &mut RequestContext) -> ApiResult<()> {
        if let Some(body) = ctx.body.as_mut() {
            clean_value(body);
        }
        for (_, value) in ctx.query.iter_mut() {
            *value = clean_text(value);
        }
        Ok(())
    }
}

/// Drops keys that would be read as query operators by the document store.
pub struct OperatorStripper;

impl Stage for OperatorStripper {
    fn name(&self) -> &'static str {
        "operator_stripper"
    }

    fn apply(&self, ctx: &mut RequestContext) -> ApiResult<()> {
        if let Some(body) = ctx.body.as_mut() {
            for key in strip_operators(body) {
                warn!(path = %ctx.path, key = %key, "Stripped operator key from body");
            }
        }

        let path = &ctx.path;
        ctx.query.retain(|(key, _)| {
            let offending = is_operator_query_key(key);
            if offending {
                warn!(path = %path, key = %key, "Stripped operator key from query");
            }
            !offending
        });
        Ok(())
    }
}

/// Ordered list of stages.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Body parser, protective headers, XSS sanitizer, operator stripper.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(BodyParser),
            Box::new(ProtectiveHeaders),
            Box::new(XssSanitizer),
            Box::new(OperatorStripper),
        ])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order, stopping at the first failure.
    pub fn run(&self, ctx: &mut RequestContext) -> ApiResult<()> {
        for stage in &self.stages {
            stage.apply(ctx)?;
        }
        Ok(())
    }
}

/// Buffer the body, refusing anything over `limit` bytes.
async fn buffer_body(headers: &HeaderMap, body: Body, limit: usize) -> ApiResult<Bytes> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(ApiError::PayloadTooLarge);
    }

    to_bytes(body, limit).await.map_err(|e| {
        debug!(error = %e, "Failed to buffer request body");
        ApiError::PayloadTooLarge
    })
}

/// Rebuild the request from the context after the stages ran.
fn rebuild(mut parts: Parts, ctx: &RequestContext) -> ApiResult<Request> {
    if ctx.query_changed() {
        let query = ctx.encoded_query();
        let path_and_query = if query.is_empty() {
            ctx.path.clone()
        } else {
            format!("{}?{}", ctx.path, query)
        };

        let mut uri_parts = parts.uri.clone().into_parts();
        uri_parts.path_and_query = Some(
            PathAndQuery::try_from(path_and_query)
                .map_err(|e| ApiError::internal(format!("Failed to rebuild query: {}", e)))?,
        );
        parts.uri = Uri::from_parts(uri_parts).map_err(|e| ApiError::internal(format!("Failed to rebuild uri: {}", e)))?;
    }

    let body = ctx.body_bytes()?;
    if ctx.body.is_some() {
        parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
    }

    Ok(Request::from_parts(parts, Body::from(body)))
}

/// Middleware running [`Pipeline`] on every request.
///
/// Requests rejected inside the pipeline still carry the hardening headers,
/// even when the failing stage ran before [`ProtectiveHeaders`].
pub async fn run_pipeline(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    let raw_body = match buffer_body(&parts.headers, body, state.config.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => return rejection(e),
    };

    let mut ctx = RequestContext::new(parts.method.clone(), &parts.uri, parts.headers.clone(), raw_body);
    let request = match state.pipeline.run(&mut ctx).and_then(|_| rebuild(parts, &ctx)) {
        Ok(request) => request,
        Err(e) => return rejection(e),
    };

    let mut response = next.run(request).await;
    response.headers_mut().extend(ctx.response_headers);
    response
}

fn rejection(err: ApiError) -> Response {
    let mut response = err.into_response();
    ProtectiveHeaders::insert_into(response.headers_mut());
    response
}
