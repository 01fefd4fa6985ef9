//! HTTP/WebSocket control surface for the panel.
//!
//! # Modules
//!
//! - [`auth`]: Login form, logout and the session cookie
//! - [`middleware`]: Cookie check for protected pages
//! - [`pages`]: The panel page
//! - [`websocket`]: Live commands and broadcasts
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health   - Health check (public)
//! GET  /login    - Login form (public)
//! POST /login    - Submit credentials, sets the session cookie (public)
//! GET  /logout   - Clear the session cookie (public)
//! GET  /         - Panel page (session required)
//! GET  /ws       - WebSocket upgrade (session required)
//! ```
//!
//! # Security
//!
//! - Session tokens are HS256 JWTs carried in an HttpOnly cookie
//! - Passwords are hashed with Argon2id plus a server-side pepper
//! - Role only decides what the panel page shows unless
//!   `ENFORCE_ADMIN_COMMANDS` is set

pub mod auth;
pub mod middleware;
pub mod pages;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use multibot::{Credentials, PanelHandle};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Control surface switches taken from configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceOptions {
    /// Reject privileged commands from non-admins
    pub enforce_admin_commands: bool,
    /// Mark the session cookie `Secure`
    pub cookie_secure: bool,
}

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned for each request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Handle to the panel actor
    pub panel: PanelHandle,
    /// Password hashing and session tokens
    pub credentials: Arc<Credentials>,
    pub options: SurfaceOptions,
}

/// Create the complete router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use mb_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let state: AppState = unimplemented!();
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout));

    // Protected routes (redirect to /login without a valid session)
    let protected_routes = Router::new()
        .route("/", get(pages::index))
        .route("/ws", get(websocket::websocket_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` while the panel actor is running, `503 Service
/// Unavailable` once it has stopped.
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"healthy","version":"1.0.0","sessions":2,"servers":1,"timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (status_code, body) = match state.panel.snapshot().await {
        Ok(snapshot) => (
            StatusCode::OK,
            json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "sessions": snapshot.sessions.len(),
                "servers": snapshot.servers.len(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({
                "status": "unhealthy",
                "version": env!("CARGO_PKG_VERSION"),
                "error": e.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }),
        ),
    };

    (status_code, Json(body))
}
