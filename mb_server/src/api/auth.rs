//! Login, logout and the session cookie.
//!
//! The panel is a browser app, so authentication is a plain HTML form. A
//! successful login stores a signed JWT in an HttpOnly cookie which the
//! session middleware checks on every protected request.
//!
//! Login:
//! ```bash
//! curl -i -X POST http://localhost:3000/login \
//!   -d 'username=admin&password=secret'
//! ```

use askama::Template;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use super::AppState;
use crate::logging::log_security_event;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "mb_session";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Login form with an optional error banner
#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate<'a> {
    error: Option<&'a str>,
}

/// Render an askama template, answering 500 if rendering fails
pub(crate) fn render(template: &impl Template) -> Response {
    match template.render() {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            log::error!("Failed to render page: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serve the login form.
pub async fn login_page() -> Response {
    render(&LoginTemplate { error: None })
}

/// Check submitted credentials and start a session.
///
/// # Response
///
/// - `303 See Other` to `/` with the session cookie on success
/// - `401 Unauthorized` with the login form on failure
/// - `503 Service Unavailable` if the panel has stopped
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = form.username.trim();

    let account = match state.panel.lookup_account(username).await {
        Ok(account) => account,
        Err(e) => {
            log::error!("Login lookup failed: {}", e);
            let message = e.to_string();
            let page = render(&LoginTemplate {
                error: Some(&message),
            });
            return (StatusCode::SERVICE_UNAVAILABLE, page).into_response();
        }
    };

    let token = state
        .credentials
        .authenticate(account.as_ref(), &form.password)
        .and_then(|claims| state.credentials.issue_token(&claims));

    match token {
        Ok(token) => {
            log::info!("User '{}' logged in", username);
            let cookie = session_cookie(
                token,
                state.credentials.token_lifetime_secs(),
                state.options.cookie_secure,
            );
            (jar.add(cookie), Redirect::to("/")).into_response()
        }
        Err(e) => {
            log_security_event("failed_login", Some(username), &e.to_string());
            let message = e.client_message();
            let page = render(&LoginTemplate {
                error: Some(&message),
            });
            (StatusCode::UNAUTHORIZED, page).into_response()
        }
    }
}

/// End the session and return to the login form.
///
/// Always answers with an expired cookie, whether or not one was sent.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let cookie = session_cookie(String::new(), 0, state.options.cookie_secure);
    (jar.add(cookie), Redirect::to("/login")).into_response()
}

/// Build the session cookie
pub fn session_cookie(token: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// Extract the session token from a request's `Cookie` headers
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header::COOKIE};

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc".to_string(), 60, false);
        assert_eq!(cookie.name(), "mb_session");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(60)));
        assert_ne!(cookie.secure(), Some(true));

        let secure = session_cookie("abc".to_string(), 60, true);
        assert_eq!(secure.secure(), Some(true));
        assert!(secure.to_string().contains("Secure"));
    }

    #[test]
    fn test_session_token_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; mb_session=tok123"));
        assert_eq!(session_token(&headers).as_deref(), Some("tok123"));
    }

    #[test]
    fn test_cleared_cookie_is_no_token() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("mb_session="));
        assert_eq!(session_token(&headers), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_login_page_without_error() {
        let page = LoginTemplate { error: None }.render().unwrap();
        assert!(page.contains(r#"name="username""#));
        assert!(!page.contains(r#"class="error""#));
    }

    #[test]
    fn test_login_error_is_escaped() {
        let page = LoginTemplate {
            error: Some("<script>alert(1)</script>"),
        }
        .render()
        .unwrap();
        assert!(page.contains(r#"class="error""#));
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>alert"));
    }
}
