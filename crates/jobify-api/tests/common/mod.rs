//! Shared fixtures for API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use serde_json::{json, Value};

use jobify_api::{ApiConfig, AppState, Entry};
use jobify_store::MemoryStore;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Config with cheap password hashing and a generous rate limit.
pub fn test_config() -> ApiConfig {
    ApiConfig {
        mongo_url: "mongodb://localhost:27017/jobify-test".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        password_memory_kib: 8,
        password_iterations: 1,
        auth_rate_limit_per_minute: 1_000,
        ..Default::default()
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

pub struct TestApp {
    pub entry: Entry,
    pub store: MemoryStore,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(test_config(), MemoryStore::new())
    }

    pub fn build(config: ApiConfig, store: MemoryStore) -> Self {
        let state = AppState::new(config, Arc::new(store.clone())).expect("valid test config");
        let entry = Entry::new(state.clone(), None);
        Self { entry, store, state }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.entry.handle(request).await;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        TestResponse { status, headers, body }
    }

    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.call(Method::GET, uri, token, None).await
    }

    /// Register a user and return `(token, user_id)`.
    pub async fn register(&self, name: &str, email: &str) -> (String, String) {
        let response = self
            .call(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({ "name": name, "email": email, "password": "secret123" })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "register failed: {}", response.body);
        (
            response.body["token"].as_str().unwrap().to_string(),
            response.body["user"]["_id"].as_str().unwrap().to_string(),
        )
    }

    /// Create a job and return its id.
    pub async fn create_job(&self, token: &str, body: Value) -> String {
        let response = self.call(Method::POST, "/api/v1/jobs", Some(token), Some(body)).await;
        assert_eq!(response.status, StatusCode::CREATED, "create job failed: {}", response.body);
        response.body["job"]["_id"].as_str().unwrap().to_string()
    }
}
