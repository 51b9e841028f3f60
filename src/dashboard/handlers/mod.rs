pub mod home;
pub use self::home::home;

pub mod login;
pub use self::login::{login_page, login_submit};

pub mod logout;
pub use self::logout::logout;

pub mod not_found;
pub use self::not_found::{fallback, not_found};

pub mod ping;
pub use self::ping::ping;

// common functions for the handlers
use super::{AppState, Page};
use crate::auth::form::MSG_FAILED_TO_PROCESS;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

pub const TITLE_LOGIN: &str = "Login Page";
pub const TITLE_DASHBOARD: &str = "Dashboard Page";
pub const TITLE_NOT_FOUND: &str = "Nothing Found";

/// Render a view, turning template failures into a bare 500.
pub fn render_view(state: &AppState, view: &str, page: &Page<'_>) -> Response {
    match state.renderer().render(view, page) {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            error!("Failed to render {view}: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, MSG_FAILED_TO_PROCESS).into_response()
        }
    }
}
