//! Integration tests for the HTTP surface.
//!
//! Tests health reporting, the login flow and the session cookie gate.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use mb_server::{
    api::{AppState, create_router},
    config::PanelConfig,
    start_panel,
};
use std::collections::HashMap;
use tower::ServiceExt; // For `oneshot` method

const ADMIN_PASSWORD: &str = "correct-horse-battery";

/// Helper to create a panel on the loopback adapter
fn test_config() -> PanelConfig {
    let vars = HashMap::from([
        ("JWT_SECRET", "test_secret_key_for_testing_only_0123456789"),
        ("PASSWORD_PEPPER", "test_pepper_for_testing_only"),
        ("ADMIN_PASSWORD", ADMIN_PASSWORD),
        ("BOT_ADAPTER", "loopback"),
    ]);
    PanelConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()), None, None)
        .expect("valid test config")
}

/// Helper to create test server
fn create_test_server() -> (axum::Router, AppState) {
    let state = start_panel(&test_config()).expect("panel starts");
    (create_router(state.clone()), state)
}

fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={username}&password={password}")))
        .unwrap()
}

/// Helper to log in and return the `Cookie` header value
async fn login_cookie(app: &axum::Router, password: &str) -> Option<String> {
    let response = app
        .clone()
        .oneshot(login_request("admin", password))
        .await
        .unwrap();
    if response.status() != StatusCode::SEE_OTHER {
        return None;
    }

    let set_cookie = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    set_cookie.split(';').next().map(str::to_string)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &axum::response::Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let (app, _) = create_test_server();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["sessions"], 0);
    assert_eq!(body["servers"], 1);
}

#[tokio::test]
async fn test_health_check_after_shutdown() {
    let (app, state) = create_test_server();
    state.panel.shutdown().await.unwrap();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ============================================================================
// Authentication Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_login_page_is_public() {
    let (app, _) = create_test_server();

    let request = Request::builder()
        .uri("/login")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("<form"));
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let (app, _) = create_test_server();

    let response = app
        .oneshot(login_request("admin", "wrong"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(body_string(response).await.contains("Invalid username or password"));
}

#[tokio::test]
async fn test_login_with_unknown_user() {
    let (app, _) = create_test_server();

    let response = app
        .oneshot(login_request("nobody", ADMIN_PASSWORD))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let (app, _) = create_test_server();

    let response = app
        .oneshot(login_request("admin", ADMIN_PASSWORD))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("mb_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let (app, _) = create_test_server();

    let request = Request::builder()
        .uri("/logout")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));

    let cookie = response.headers().get(header::SET_COOKIE).unwrap();
    assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
}

// ============================================================================
// Protected Page Tests
// ============================================================================

#[tokio::test]
async fn test_panel_requires_session() {
    let (app, _) = create_test_server();

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_panel_rejects_forged_cookie() {
    let (app, _) = create_test_server();

    let request = Request::builder()
        .uri("/")
        .header(header::COOKIE, "mb_session=not.a.jwt")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_panel_after_login_shows_admin_cards() {
    let (app, _) = create_test_server();
    let cookie = login_cookie(&app, ADMIN_PASSWORD)
        .await
        .expect("login succeeds");

    let request = Request::builder()
        .uri("/")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_string(response).await;
    assert!(page.contains(r#"data-role="admin""#));
    assert!(!page.contains("display:none"));
}

#[tokio::test]
async fn test_websocket_requires_session() {
    let (app, _) = create_test_server();

    let request = Request::builder().uri("/ws").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}
