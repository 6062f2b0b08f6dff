//! Shared test helpers for integration tests.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use parley_api::AppState;
use parley_core::config::AppConfig;
use parley_core::config::database::DatabaseConfig;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for reaching into the hub
    pub state: AppState,
}

/// A registered user and the session issued at registration.
#[derive(Debug, Clone)]
pub struct Account {
    pub user_id: String,
    pub token: String,
}

impl TestApp {
    /// Create a new test application over a private in-memory database.
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    /// Create a test application from `config`, keeping its database in memory.
    pub async fn with_config(mut config: AppConfig) -> Self {
        config.database = DatabaseConfig::default();
        let state = parley_api::build_state(config)
            .await
            .expect("Failed to build state");
        let router = parley_api::build_app(state.clone());
        Self { router, state }
    }

    /// Register `username` with a fixed password.
    pub async fn register(&self, username: &str) -> Account {
        let response = self
            .request(
                "POST",
                "/api/auth/register",
                Some(serde_json::json!({ "username": username, "password": "hunter22" })),
                None,
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Register failed: {:?}",
            response.body
        );

        Account {
            user_id: response.body["user_id"].as_str().unwrap().to_string(),
            token: response.body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Send a friend request from `from` to `to` and accept it. Returns the direct chat id.
    pub async fn befriend(&self, from: &Account, to: &Account) -> String {
        let path = format!("/api/users/{}/friend?type=id", to.user_id);
        let sent = self.request("PUT", &path, None, Some(&from.token)).await;
        assert_eq!(sent.status, StatusCode::OK, "{:?}", sent.body);

        let path = format!("/api/users/{}/friend?type=id", from.user_id);
        let accepted = self.request("PUT", &path, None, Some(&to.token)).await;
        assert_eq!(accepted.status, StatusCode::OK, "{:?}", accepted.body);
        accepted.body["chat"]["id"].as_str().unwrap().to_string()
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
