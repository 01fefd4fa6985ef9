//! The panel page.
//!
//! A single static page; all live data arrives over `/ws`. The role only
//! decides whether the admin cards are rendered.

use askama::Template;
use axum::{extract::Extension, response::Response};
use multibot::{PanelClaims, Role};

use super::auth::render;

#[derive(Template)]
#[template(path = "panel.html")]
struct PanelTemplate<'a> {
    username: &'a str,
    role: Role,
    is_admin: bool,
}

impl<'a> PanelTemplate<'a> {
    fn for_claims(claims: &'a PanelClaims) -> Self {
        Self {
            username: &claims.sub,
            role: claims.role,
            is_admin: claims.is_admin(),
        }
    }
}

/// Serve the panel for the logged-in user.
pub async fn index(Extension(claims): Extension<PanelClaims>) -> Response {
    render(&PanelTemplate::for_claims(&claims))
}
