//! Shared helpers for the HTTP-level tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tower::ServiceExt;

use skillswap::config::AppConfig;
use skillswap::database::{init_db, AppState};
use skillswap::route::create_app;

pub const TEST_SECRET: &str = "test-secret";

/// Creates a test application backed by a temporary database
///
/// bcrypt runs at its minimum cost so the suite stays fast.
pub fn setup_test_app() -> (Router, NamedTempFile) {
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = temp_db.path().to_str().unwrap();

    let db = init_db(db_path).expect("Failed to initialize test database");
    let config = AppConfig::new(TEST_SECRET).with_bcrypt_cost(4);

    (create_app(AppState::new(db, config)), temp_db)
}

/// Parses a response body as JSON; an empty body becomes `Value::Null`
pub async fn response_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

/// Sends one request through the router
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, response_json(response.into_body()).await)
}

/// Registers `username` with `role`; returns (token, user id)
pub async fn register(app: &Router, username: &str, role: &str) -> (String, String) {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "password123",
            "role": role,
            "age": 25,
            "languages": ["English"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register {username}: {body}");

    (
        body["token"].as_str().unwrap().to_string(),
        body["id"].as_str().unwrap().to_string(),
    )
}

fn skills(pairs: &[(&str, &str)]) -> Vec<Value> {
    pairs
        .iter()
        .map(|(name, category)| json!({ "skillName": name, "category": category }))
        .collect()
}

/// Fills in bio and skill lists; `(skillName, category)` pairs
pub async fn complete_profile(
    app: &Router,
    token: &str,
    teach: &[(&str, &str)],
    learn: &[(&str, &str)],
) -> Value {
    let (status, body) = send(
        app,
        "PUT",
        "/api/auth/profile",
        Some(token),
        Some(json!({
            "bio": "Always learning",
            "skillsToTeach": skills(teach),
            "skillsToLearn": skills(learn)
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "profile update: {body}");
    body
}
