//! Shared helpers for API integration tests.
//!
//! Builds the application router through the production
//! [`build_app_router`] so tests exercise the same middleware stack (CORS,
//! request ID, timeout, tracing, panic recovery) that the binary uses.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use leadbook_api::auth::jwt::{generate_access_token, JwtConfig};
use leadbook_api::auth::password::hash_password;
use leadbook_api::config::ServerConfig;
use leadbook_api::router::build_app_router;
use leadbook_api::state::AppState;
use leadbook_core::types::DbId;
use leadbook_db::models::user::CreateUser;
use leadbook_db::repositories::UserRepo;

/// Build a test `ServerConfig` with safe defaults.
///
/// The rate limiter budget is effectively unlimited so ordinary tests can
/// mutate freely; rate-limit behaviour gets its own config via
/// [`test_config_with_rate_limit`].
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        rate_limit_max_ops: 10_000,
        rate_limit_window_secs: 60,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// Test config with a small rate-limit budget.
pub fn test_config_with_rate_limit(max_ops: u32) -> ServerConfig {
    ServerConfig {
        rate_limit_max_ops: max_ops,
        ..test_config()
    }
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

/// Build the app router with a custom configuration.
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState::new(pool, config.clone());
    build_app_router(state, &config)
}

/// Insert a user directly and mint a valid access token for them.
pub async fn seed_user(pool: &PgPool, username: &str) -> (DbId, String) {
    let password_hash = hash_password("test-password-123").expect("hashing should succeed");
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            display_name: username.to_string(),
            password_hash,
        },
    )
    .await
    .expect("user insert should succeed");

    let token = generate_access_token(user.id, username, &test_config().jwt)
        .expect("token generation should succeed");
    (user.id, token)
}

/// Send a request and return the raw response.
///
/// The router is cloned per call so one app value serves a whole test.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("request should build"),
        None => builder.body(Body::empty()).expect("request should build"),
    };

    app.clone()
        .oneshot(request)
        .await
        .expect("request should not fail at the transport level")
}

/// GET helper without a body.
pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, Method::GET, uri, token, None).await
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}

/// Read a response body as a UTF-8 string.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body should be valid UTF-8")
}

/// Assert a response status, panicking with the body for easier debugging.
pub async fn expect_status(response: Response<Body>, expected: StatusCode) -> serde_json::Value {
    let status = response.status();
    let json = body_json(response).await;
    assert_eq!(status, expected, "unexpected status, body: {json}");
    json
}

/// A valid buyer creation payload.
pub fn sample_buyer_payload() -> serde_json::Value {
    serde_json::json!({
        "full_name": "Asha Verma",
        "email": "asha@example.com",
        "phone": "9876543210",
        "city": "Mohali",
        "property_type": "Apartment",
        "bhk": "2",
        "purpose": "Buy",
        "budget_min": 2_500_000,
        "budget_max": 4_000_000,
        "timeline": "0-3m",
        "source": "Website",
        "tags": ["hot", "nri"]
    })
}
