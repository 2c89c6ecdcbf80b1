//! API Integration Tests
//!
//! Every test drives a fresh in-memory router with `oneshot`.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use roastery_api::{create_router, create_router_for_testing, state::AppState, test_state};
use roastery_core::{UserRole, UserStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Helper to create a test request
fn create_json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

fn setup() -> (Arc<AppState>, Router) {
    let state = test_state();
    let app = create_router(state.clone());
    (state, app)
}

async fn register(app: &Router, username: &str) -> Value {
    let (status, body) = send(
        app,
        create_json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({
                "username": username,
                "email": format!("{username}@x.com"),
                "password": "password123"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register {username}: {body}");
    body
}

async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        create_json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": username, "password": password })),
        ),
    )
    .await
}

/// Register a user, give them a role, and return a token carrying it
async fn token_with_role(state: &AppState, app: &Router, username: &str, role: UserRole) -> String {
    register(app, username).await;

    let mut user = state.users.find_by_username(username).await.unwrap().unwrap();
    user.role = role;
    state.users.update(&user).await.unwrap();

    let (status, body) = login(app, username, "password123").await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = create_router_for_testing();

    let (status, json) = send(&app, create_json_request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_readiness_check() {
    let app = create_router_for_testing();

    let (status, json) = send(&app, create_json_request("GET", "/ready", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ready"], true);
    assert_eq!(json["checks"]["in_memory"], true);
}

#[tokio::test]
async fn test_not_ready_while_draining() {
    let (state, app) = setup();
    state.set_ready(false);

    let (status, json) = send(&app, create_json_request("GET", "/ready", None, None)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["ready"], false);
    assert_eq!(json["checks"]["database"], true);
}

#[tokio::test]
async fn test_prometheus_metrics() {
    let app = create_router_for_testing();
    send(&app, create_json_request("GET", "/api/v1/beans", None, None)).await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("roastery_http_requests_total"));
    assert!(text.contains("roastery_uptime_seconds"));
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = create_router_for_testing();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
}

// =============================================================================
// Authentication Tests
// =============================================================================

#[tokio::test]
async fn test_register_and_login() {
    let (_, app) = setup();

    let registered = register(&app, "alice").await;
    assert!(!registered["token"].as_str().unwrap().is_empty());
    assert!(!registered["refreshToken"].as_str().unwrap().is_empty());
    assert!(registered["expiresAt"].is_string());

    let (status, _) = login(&app, "alice", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = login(&app, "nobody", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = login(&app, "alice", "password123").await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["refreshToken"], registered["refreshToken"]);
}

#[tokio::test]
async fn test_register_conflicts() {
    let (_, app) = setup();
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        create_json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({
                "username": "alice",
                "email": "other@x.com",
                "password": "password123"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = send(
        &app,
        create_json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({
                "username": "alice2",
                "email": "ALICE@X.COM",
                "password": "password123"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_validation() {
    let (_, app) = setup();

    let (status, body) = send(
        &app,
        create_json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({
                "username": "al",
                "email": "not-an-email",
                "password": "short"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["details"].as_str().unwrap().contains("password"));
}

#[tokio::test]
async fn test_refresh_rotation() {
    let (_, app) = setup();
    let registered = register(&app, "bob").await;

    let refresh_body = json!({
        "token": registered["token"],
        "refreshToken": registered["refreshToken"]
    });

    let (status, rotated) = send(
        &app,
        create_json_request("POST", "/api/v1/auth/refresh", None, Some(refresh_body.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(rotated["refreshToken"], registered["refreshToken"]);

    // The consumed refresh token cannot be used again
    let (status, _) = send(
        &app,
        create_json_request("POST", "/api/v1/auth/refresh", None, Some(refresh_body)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        create_json_request(
            "POST",
            "/api/v1/auth/refresh",
            None,
            Some(json!({
                "token": "garbage",
                "refreshToken": rotated["refreshToken"]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_revoke_is_idempotent() {
    let (_, app) = setup();
    let registered = register(&app, "carol").await;
    let token = registered["token"].as_str().unwrap();
    let revoke = json!({ "refreshToken": registered["refreshToken"], "reason": "lost device" });

    let (status, _) = send(
        &app,
        create_json_request("POST", "/api/v1/auth/revoke", Some(token), Some(revoke.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        create_json_request("POST", "/api/v1/auth/revoke", Some(token), Some(revoke)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A revoked refresh token no longer refreshes
    let (status, _) = send(
        &app,
        create_json_request(
            "POST",
            "/api/v1/auth/refresh",
            None,
            Some(json!({ "token": token, "refreshToken": registered["refreshToken"] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_requires_token() {
    let (_, app) = setup();
    let registered = register(&app, "dave").await;

    let (status, _) = send(&app, create_json_request("GET", "/api/v1/auth/me", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        create_json_request("GET", "/api/v1/auth/me", Some("not-a-jwt"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, me) = send(
        &app,
        create_json_request(
            "GET",
            "/api/v1/auth/me",
            registered["token"].as_str(),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "dave");
    assert_eq!(me["role"], "user");
    assert!(me.get("passwordHash").is_none());
}

// =============================================================================
// Catalog Tests
// =============================================================================

#[tokio::test]
async fn test_catalog_requires_manager_role() {
    let (state, app) = setup();
    let user_token = token_with_role(&state, &app, "erin", UserRole::User).await;
    let bean = json!({ "name": "Huila", "roaster": "Acme", "roastLevel": "medium" });

    let (status, _) = send(
        &app,
        create_json_request("POST", "/api/v1/beans", None, Some(bean.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        create_json_request("POST", "/api/v1/beans", Some(&user_token), Some(bean.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let brewer_token = token_with_role(&state, &app, "frank", UserRole::Brewer).await;
    let (status, created) = send(
        &app,
        create_json_request("POST", "/api/v1/beans", Some(&brewer_token), Some(bean)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["roastLevel"], "medium");

    // Reads stay anonymous
    let (status, beans) = send(&app, create_json_request("GET", "/api/v1/beans", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(beans.as_array().unwrap().len(), 1);

    let uri = format!("/api/v1/beans/{}", created["id"].as_str().unwrap());
    let (status, fetched) = send(&app, create_json_request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Huila");
}

#[tokio::test]
async fn test_origin_in_use_conflict() {
    let (state, app) = setup();
    let token = token_with_role(&state, &app, "admin", UserRole::Admin).await;

    let (status, origin) = send(
        &app,
        create_json_request(
            "POST",
            "/api/v1/origins",
            Some(&token),
            Some(json!({ "country": "Ethiopia", "altitudeM": 1900 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        create_json_request(
            "POST",
            "/api/v1/beans",
            Some(&token),
            Some(json!({ "name": "Guji", "roaster": "Acme", "originId": origin["id"] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/v1/origins/{}", origin["id"].as_str().unwrap());
    let (status, _) = send(&app, create_json_request("DELETE", &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_bean_not_found() {
    let app = create_router_for_testing();
    let uri = format!("/api/v1/beans/{}", uuid::Uuid::new_v4());

    let (status, body) = send(&app, create_json_request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_review_flow() {
    let (state, app) = setup();
    let brewer = token_with_role(&state, &app, "grace", UserRole::Brewer).await;
    let author = token_with_role(&state, &app, "heidi", UserRole::User).await;
    let other = token_with_role(&state, &app, "ivan", UserRole::User).await;

    let (_, bean) = send(
        &app,
        create_json_request(
            "POST",
            "/api/v1/beans",
            Some(&brewer),
            Some(json!({ "name": "Kenya AA", "roaster": "Acme", "roastLevel": "light" })),
        ),
    )
    .await;

    let (status, _) = send(
        &app,
        create_json_request(
            "POST",
            "/api/v1/reviews",
            Some(&author),
            Some(json!({ "beanId": bean["id"], "rating": 7 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, review) = send(
        &app,
        create_json_request(
            "POST",
            "/api/v1/reviews",
            Some(&author),
            Some(json!({ "beanId": bean["id"], "rating": 5, "brewMethod": "V60" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let reviews_uri = format!("/api/v1/beans/{}/reviews", bean["id"].as_str().unwrap());
    let (status, reviews) = send(&app, create_json_request("GET", &reviews_uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviews.as_array().unwrap().len(), 1);

    let review_uri = format!("/api/v1/reviews/{}", review["id"].as_str().unwrap());
    let (status, _) = send(
        &app,
        create_json_request("PUT", &review_uri, Some(&other), Some(json!({ "rating": 1 }))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = send(
        &app,
        create_json_request("PUT", &review_uri, Some(&author), Some(json!({ "rating": 4 }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["rating"], 4);

    let (status, _) = send(&app, create_json_request("DELETE", &review_uri, Some(&author), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_private_list_visibility() {
    let (state, app) = setup();
    let brewer = token_with_role(&state, &app, "judy", UserRole::Brewer).await;
    let owner = token_with_role(&state, &app, "mallory", UserRole::User).await;
    let stranger = token_with_role(&state, &app, "niaj", UserRole::User).await;

    let (_, bean) = send(
        &app,
        create_json_request(
            "POST",
            "/api/v1/beans",
            Some(&brewer),
            Some(json!({ "name": "Sidamo", "roaster": "Acme" })),
        ),
    )
    .await;

    let (status, list) = send(
        &app,
        create_json_request(
            "POST",
            "/api/v1/lists",
            Some(&owner),
            Some(json!({ "name": "Secret stash", "isPublic": false })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let list_uri = format!("/api/v1/lists/{}", list["id"].as_str().unwrap());
    let add_uri = format!("{list_uri}/beans/{}", bean["id"].as_str().unwrap());

    let (status, _) = send(&app, create_json_request("POST", &add_uri, Some(&stranger), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for _ in 0..2 {
        let (status, updated) =
            send(&app, create_json_request("POST", &add_uri, Some(&owner), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["beanIds"].as_array().unwrap().len(), 1);
    }

    let (status, _) = send(&app, create_json_request("GET", &list_uri, None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, create_json_request("GET", &list_uri, Some(&stranger), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, fetched) = send(&app, create_json_request("GET", &list_uri, Some(&owner), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Secret stash");

    let (status, mine) = send(&app, create_json_request("GET", "/api/v1/lists", Some(&owner), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
}
