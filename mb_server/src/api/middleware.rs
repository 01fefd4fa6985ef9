//! Session middleware for protected endpoints.
//!
//! Validates the JWT in the session cookie and injects the caller's
//! [`PanelClaims`] into request extensions for downstream handlers:
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use multibot::PanelClaims;
//!
//! async fn protected_handler(Extension(claims): Extension<PanelClaims>) -> String {
//!     format!("Logged in as {}", claims.sub)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::{AppState, auth::session_token};

/// Require a valid session cookie.
///
/// # Behavior
///
/// - **Success**: Token valid → Injects `PanelClaims` → Calls next handler
/// - **Missing or invalid cookie**: Redirects to `/login`
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = match session_token(request.headers()) {
        Some(token) => state.credentials.verify_token(&token),
        None => return Redirect::to("/login").into_response(),
    };

    match claims {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            log::debug!("Rejected session cookie: {}", e);
            Redirect::to("/login").into_response()
        }
    }
}
