//! API Integration Tests
//!
//! Every test drives the full router against the in-memory store.
//!
//! Author: hephaex@gmail.com

use afl_api::{create_router, AppState};
use afl_core::{AppConfig, UserRole};
use afl_store::MemoryStore;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "integration-secret".to_string();
    config.auth.hash_memory_kib = 4096;
    config.auth.hash_iterations = 1;
    config.auth.hash_parallelism = 1;
    config.rate_limit.enabled = false;
    config
}

fn test_app_with(config: AppConfig) -> (Router, Arc<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(config, store.clone()).unwrap());
    (create_router(state.clone()), state, store)
}

fn test_app() -> (Router, Arc<AppState>, Arc<MemoryStore>) {
    test_app_with(test_config())
}

/// Helper to create a test request
fn create_json_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn authorized_request(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn register(app: &Router, email: &str) -> (StatusCode, Value) {
    send(
        app,
        create_json_request(
            "POST",
            "/register",
            Some(json!({ "name": "Ada", "email": email, "password": "secret1" })),
        ),
    )
    .await
}

async fn login_token(app: &Router, email: &str) -> String {
    let (status, json) = send(
        app,
        create_json_request(
            "POST",
            "/login",
            Some(json!({ "email": email, "password": "secret1" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["token"].as_str().unwrap().to_string()
}

async fn create_platform(app: &Router, token: &str) -> String {
    let (status, json) = send(
        app,
        authorized_request(
            "/platform",
            token,
            json!({
                "name": "ShopLink",
                "description": "Outdoor gear",
                "niches": ["outdoor", "camping", "outdoor"],
                "commissionRate": 7.5,
                "apiUrl": "https://api.shoplink.example.com"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

// =============================================================================
// Registration and Login Tests
// =============================================================================

#[tokio::test]
async fn test_register_success() {
    let (app, _, _) = test_app();

    let (status, json) = register(&app, "ada@example.com").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "User registered successfully");
    assert!(json["id"].is_string());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let (app, _, _) = test_app();
    register(&app, "ada@example.com").await;

    let (status, json) = register(&app, "Ada@Example.com").await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "User already exists");
}

#[tokio::test]
async fn test_register_empty_body_lists_all_violations_in_order() {
    let (app, _, _) = test_app();

    let (status, json) = send(
        &app,
        create_json_request("POST", "/register", Some(json!({}))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = json["errors"].as_array().unwrap();
    let fields: Vec<&str> = errors
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "email", "password"]);
    assert_eq!(errors[0]["message"], "Name is required");
}

#[tokio::test]
async fn test_register_malformed_json() {
    let (app, _, _) = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/register")
        .header("Content-Type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let (status, json) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_login_returns_token_with_identity() {
    let (app, state, _) = test_app();
    let (_, registered) = register(&app, "ada@example.com").await;

    let token = login_token(&app, "ada@example.com").await;
    let identity = state.tokens.verify(&token).unwrap();

    assert_eq!(identity.user_id.to_string(), registered["id"].as_str().unwrap());
    assert_eq!(identity.role, UserRole::User);
}

#[tokio::test]
async fn test_login_failures_are_identical() {
    let (app, _, _) = test_app();
    register(&app, "ada@example.com").await;

    let unknown = send(
        &app,
        create_json_request(
            "POST",
            "/login",
            Some(json!({ "email": "nobody@example.com", "password": "secret1" })),
        ),
    )
    .await;
    let wrong = send(
        &app,
        create_json_request(
            "POST",
            "/login",
            Some(json!({ "email": "ada@example.com", "password": "not-it" })),
        ),
    )
    .await;

    assert_eq!(unknown.0, StatusCode::BAD_REQUEST);
    assert_eq!(unknown, wrong);
    assert_eq!(unknown.1["message"], "Invalid email or password");
}

// =============================================================================
// Auth Gate Tests
// =============================================================================

#[tokio::test]
async fn test_platform_without_token_is_unauthorized() {
    let (app, _, _) = test_app();

    let (status, json) = send(
        &app,
        create_json_request("POST", "/platform", Some(json!({ "name": "ShopLink" }))),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Access denied. No token provided.");
}

#[tokio::test]
async fn test_affiliate_without_token_is_unauthorized() {
    let (app, _, store) = test_app();

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            "/affiliate",
            Some(json!({
                "url": "https://example.com",
                "platformId": uuid::Uuid::new_v4().to_string()
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Access denied. No token provided.");
    assert_eq!(store.link_count().await, 0);
}

#[tokio::test]
async fn test_affiliate_with_expired_token_is_bad_request() {
    let (app, state, _) = test_app();
    let (_, registered) = register(&app, "ada@example.com").await;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let identity = afl_api::auth::Identity {
        user_id: registered["id"].as_str().unwrap().parse().unwrap(),
        role: UserRole::User,
    };
    let expired = state.tokens.issue_at(&identity, now - 2 * 3600).unwrap();

    let (status, json) = send(
        &app,
        authorized_request(
            "/affiliate",
            &expired,
            json!({ "url": "https://example.com", "platformId": "x" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Invalid token.");
}

// =============================================================================
// Platform and Affiliate Link Tests
// =============================================================================

#[tokio::test]
async fn test_create_platform() {
    let (app, _, store) = test_app();
    register(&app, "ada@example.com").await;
    let token = login_token(&app, "ada@example.com").await;

    let id = create_platform(&app, &token).await;

    let platform = store
        .get_platform(uuid::Uuid::parse_str(&id).unwrap())
        .await
        .unwrap();
    assert_eq!(platform.name, "ShopLink");
    assert_eq!(platform.niches, vec!["outdoor", "camping"]);
    assert_eq!(platform.commission_rate, 7.5);
    assert_eq!(store.platform_count().await, 1);
}

#[tokio::test]
async fn test_create_platform_requires_name() {
    let (app, _, _) = test_app();
    register(&app, "ada@example.com").await;
    let token = login_token(&app, "ada@example.com").await;

    let (status, json) = send(
        &app,
        authorized_request("/platform", &token, json!({ "description": "no name" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errors"][0]["field"], "name");
    assert_eq!(json["errors"][0]["message"], "Platform name is required");
}

#[tokio::test]
async fn test_affiliate_link_flow() {
    let (app, _, store) = test_app();
    register(&app, "ada@example.com").await;
    let token = login_token(&app, "ada@example.com").await;
    let platform_id = create_platform(&app, &token).await;

    let (status, json) = send(
        &app,
        authorized_request(
            "/affiliate",
            &token,
            json!({ "url": "https://shop.example.com/p/1?ref=ada", "platformId": platform_id }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "Affiliate link created successfully");

    let link = store
        .get_link(json["id"].as_str().unwrap().parse().unwrap())
        .await
        .unwrap();
    assert_eq!(link.platform_id.to_string(), platform_id);
    assert_eq!(store.link_count().await, 1);
}

#[tokio::test]
async fn test_affiliate_link_malformed_url() {
    let (app, _, store) = test_app();
    register(&app, "ada@example.com").await;
    let token = login_token(&app, "ada@example.com").await;
    let platform_id = create_platform(&app, &token).await;

    let (status, json) = send(
        &app,
        authorized_request(
            "/affiliate",
            &token,
            json!({ "url": "shop.example.com/p 1", "platformId": platform_id }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errors"][0]["field"], "url");
    assert_eq!(store.link_count().await, 0);
}

#[tokio::test]
async fn test_affiliate_link_reports_every_bad_field() {
    let (app, _, store) = test_app();
    register(&app, "ada@example.com").await;
    let token = login_token(&app, "ada@example.com").await;

    let (status, json) = send(
        &app,
        authorized_request(
            "/affiliate",
            &token,
            json!({ "url": "not-a-url", "platformId": "not-a-uuid" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["errors"],
        json!([
            { "field": "url", "message": "Please include a valid URL" },
            { "field": "platformId", "message": "Platform id must be a valid id" }
        ])
    );
    assert_eq!(store.link_count().await, 0);
}

#[tokio::test]
async fn test_affiliate_link_non_uuid_platform() {
    let (app, _, _) = test_app();
    register(&app, "ada@example.com").await;
    let token = login_token(&app, "ada@example.com").await;

    let (status, json) = send(
        &app,
        authorized_request(
            "/affiliate",
            &token,
            json!({ "url": "https://example.com", "platformId": "not-a-uuid" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errors"][0]["field"], "platformId");
}

#[tokio::test]
async fn test_affiliate_link_unknown_platform() {
    let (app, _, store) = test_app();
    register(&app, "ada@example.com").await;
    let token = login_token(&app, "ada@example.com").await;

    let (status, json) = send(
        &app,
        authorized_request(
            "/affiliate",
            &token,
            json!({
                "url": "https://example.com",
                "platformId": uuid::Uuid::new_v4().to_string()
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["message"], "Platform not found");
    assert_eq!(store.link_count().await, 0);
}

// =============================================================================
// Health, Docs and Middleware Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let (app, _, _) = test_app();

    let (status, json) = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["store"], "memory");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_openapi_document_served() {
    let (app, _, _) = test_app();

    let (status, json) = send(
        &app,
        Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/register"].is_object());
    assert!(json["components"]["securitySchemes"]["bearer_auth"].is_object());
}

#[tokio::test]
async fn test_security_headers_on_api_responses() {
    let (app, _, _) = test_app();

    let response = app
        .oneshot(create_json_request("POST", "/login", Some(json!({}))))
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert!(headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
}

#[tokio::test]
async fn test_rate_limit_per_client() {
    let mut config = test_config();
    config.rate_limit.enabled = true;
    config.rate_limit.max_requests = 2;
    config.rate_limit.window_secs = 900;
    config.server.trust_proxy_headers = true;
    let (app, _, _) = test_app_with(config);

    let health = |ip: &str| {
        Request::builder()
            .uri("/health")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };

    for _ in 0..2 {
        let response = app.clone().oneshot(health("198.51.100.7")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let blocked = app.clone().oneshot(health("198.51.100.7")).await.unwrap();
    assert_eq!(blocked.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(blocked.headers().contains_key(header::RETRY_AFTER));
    assert!(blocked
        .headers()
        .contains_key(header::X_CONTENT_TYPE_OPTIONS));

    let other = app.clone().oneshot(health("198.51.100.8")).await.unwrap();
    assert_eq!(other.status(), StatusCode::OK);
}
