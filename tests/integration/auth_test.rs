//! Integration tests for registration, login and logout.

mod helpers;

use axum::http::StatusCode;

#[tokio::test]
async fn test_register_then_login() {
    let app = helpers::TestApp::new().await;
    let account = app.register("alice").await;
    assert!(!account.token.is_empty());

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "username": "alice", "password": "hunter22" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user_id"], account.user_id.as_str());
    assert!(response.body["token"].as_str().is_some());
    assert_ne!(response.body["token"], account.token.as_str());
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let app = helpers::TestApp::new().await;
    app.register("bob").await;

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(serde_json::json!({ "username": "BOB", "password": "whatever" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "CONFLICT");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = helpers::TestApp::new().await;
    app.register("carol").await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "username": "carol", "password": "nope" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Invalid username or password.");
}

#[tokio::test]
async fn test_malformed_body_is_a_validation_error() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "username": "dave" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION");
}

#[tokio::test]
async fn test_logout_revokes_the_token() {
    let app = helpers::TestApp::new().await;
    let account = app.register("erin").await;

    let response = app
        .request("POST", "/api/auth/logout", None, Some(&account.token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Logged out.");

    let again = app
        .request("POST", "/api/auth/logout", None, Some(&account.token))
        .await;
    assert_eq!(again.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_requires_bearer() {
    let app = helpers::TestApp::new().await;

    let missing = app.request("POST", "/api/auth/logout", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let garbage = app
        .request("POST", "/api/auth/logout", None, Some("not-a-jwt"))
        .await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_reports_counts() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["database"], true);
    assert_eq!(response.body["connections"], 0);
    assert_eq!(response.body["online_users"], 0);
}

#[tokio::test]
async fn test_current_user_profile() {
    let app = helpers::TestApp::new().await;
    let account = app.register("  frank  ").await;

    let response = app.request("GET", "/api/auth/user", None, Some(&account.token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], account.user_id.as_str());
    assert_eq!(response.body["username"], "frank");

    let anonymous = app.request("GET", "/api/auth/user", None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_blank_credentials_are_rejected_before_lookup() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(serde_json::json!({ "username": "   ", "password": "secret" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Username must not be empty.");
}

#[tokio::test]
async fn test_disabled_signup_refuses_registration() {
    let mut config = parley_core::config::AppConfig::default();
    config.auth.disable_signup = true;
    let app = helpers::TestApp::with_config(config).await;

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(serde_json::json!({ "username": "gina", "password": "secret" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["message"], "User registration is currently turned off.");
}
